//! `SeaORM` Entity for activities table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub actor_member_id: i32,
    /// One of the `ActivityKind` strings.
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub expense_id: Option<i32>,
    pub settlement_id: Option<i32>,
    pub from_member_id: Option<i32>,
    pub to_member_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub metadata: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(
        belongs_to = "super::group_members::Entity",
        from = "Column::ActorMemberId",
        to = "super::group_members::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
