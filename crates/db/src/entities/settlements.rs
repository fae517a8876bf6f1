//! `SeaORM` Entity for settlements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub from_member_id: i32,
    pub to_member_id: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub currency: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((18, 8)))")]
    pub exchange_rate: Decimal,
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
        from = "Column::FromMemberId",
        to = "super::group_members::Column::Id",
        on_delete = "Cascade"
    )]
    FromMember,
    #[sea_orm(
        belongs_to = "super::group_members::Entity",
        from = "Column::ToMemberId",
        to = "super::group_members::Column::Id",
        on_delete = "Cascade"
    )]
    ToMember,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
