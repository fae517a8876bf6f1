//! Settlement repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use spendbee_core::activity::{ActivityKind, ActivityMetadata};
use spendbee_core::balance::SettlementRecord;
use spendbee_shared::types::{GroupId, MemberId, SettlementId};

use super::activity::{NewActivity, insert_activity};
use crate::entities::settlements;

/// Input for recording a settlement.
#[derive(Debug, Clone)]
pub struct CreateSettlementInput {
    /// Owning group.
    pub group_id: GroupId,
    /// Membership of the user recording it.
    pub actor: MemberId,
    /// Paying member.
    pub from: MemberId,
    /// Receiving member.
    pub to: MemberId,
    /// Amount paid.
    pub amount: Decimal,
    /// Normalized currency code.
    pub currency: String,
    /// Settlement currency to group base currency, at creation time.
    pub exchange_rate: Decimal,
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a settlement and its `settlement_created` activity in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails.
    pub async fn create(&self, input: CreateSettlementInput) -> Result<settlements::Model, DbErr> {
        let txn = self.db.begin().await?;

        let settlement = settlements::ActiveModel {
            group_id: Set(input.group_id.into_inner()),
            from_member_id: Set(input.from.into_inner()),
            to_member_id: Set(input.to.into_inner()),
            amount: Set(input.amount),
            currency: Set(Some(input.currency.clone())),
            exchange_rate: Set(input.exchange_rate),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_activity(
            &txn,
            NewActivity {
                group_id: input.group_id,
                actor: input.actor,
                kind: ActivityKind::SettlementCreated,
                expense_id: None,
                settlement_id: Some(SettlementId::new(settlement.id)),
                from: Some(input.from),
                to: Some(input.to),
                amount: Some(input.amount),
                currency: Some(input.currency),
                metadata: ActivityMetadata::default(),
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            settlement_id = settlement.id,
            group_id = settlement.group_id,
            from = settlement.from_member_id,
            to = settlement.to_member_id,
            amount = %settlement.amount,
            "Settlement recorded"
        );
        Ok(settlement)
    }

    /// Lists a group's settlements, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_group(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<settlements::Model>, DbErr> {
        settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id.into_inner()))
            .order_by_desc(settlements::Column::CreatedAt)
            .order_by_desc(settlements::Column::Id)
            .all(&self.db)
            .await
    }
}

/// Projects a settlement row into the balance aggregator's input.
#[must_use]
pub fn to_settlement_record(row: &settlements::Model) -> SettlementRecord {
    SettlementRecord {
        from_member: MemberId::new(row.from_member_id),
        to_member: MemberId::new(row.to_member_id),
        amount: row.amount,
        currency: row.currency.clone(),
    }
}
