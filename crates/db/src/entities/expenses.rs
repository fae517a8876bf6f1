//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub description: String,
    pub note: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub currency: Option<String>,
    /// Expense currency to group base currency, captured at creation.
    #[sea_orm(column_type = "Decimal(Some((18, 8)))")]
    pub exchange_rate: Decimal,
    pub paid_by: i32,
    pub receipt_image_url: Option<String>,
    pub receipt_items: Option<Json>,
    pub attachments: Option<Json>,
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
        from = "Column::PaidBy",
        to = "super::group_members::Column::Id",
        on_delete = "Cascade"
    )]
    Payer,
    #[sea_orm(has_many = "super::expense_shares::Entity")]
    ExpenseShares,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payer.def()
    }
}

impl Related<super::expense_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseShares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
