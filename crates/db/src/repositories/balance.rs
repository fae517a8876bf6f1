//! Loads everything the balance aggregator needs for one group.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use spendbee_core::balance::{
    BalanceError, ExpenseRecord, GroupInfo, MemberBalance, MemberInfo, SettlementRecord,
    ShareRecord, compute_balances,
};
use spendbee_core::currency::RateTable;
use spendbee_shared::types::{ExpenseId, GroupId, MemberId};

use super::expense::ExpenseRepository;
use super::member::MemberRepository;
use super::settlement::to_settlement_record;
use crate::entities::{expenses, groups, settlements};

/// Balance inputs for one group, loaded from storage.
#[derive(Debug, Clone)]
pub struct BalanceInputs {
    /// The group.
    pub group: GroupInfo,
    /// Every member, in join order.
    pub members: Vec<MemberInfo>,
    /// The group's expenses.
    pub expenses: Vec<ExpenseRecord>,
    /// Shares of those expenses.
    pub shares: Vec<ShareRecord>,
    /// The group's settlements.
    pub settlements: Vec<SettlementRecord>,
}

impl BalanceInputs {
    /// Runs the aggregator over the loaded rows.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError` if a currency cannot be converted.
    pub fn compute(&self, rates: &RateTable) -> Result<Vec<MemberBalance>, BalanceError> {
        compute_balances(
            &self.group,
            &self.members,
            &self.expenses,
            &self.shares,
            &self.settlements,
            rates,
        )
    }
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the group, members, expenses, shares and settlements.
    ///
    /// Returns `None` if the group does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn load_inputs(&self, group_id: GroupId) -> Result<Option<BalanceInputs>, DbErr> {
        let Some(group) = groups::Entity::find_by_id(group_id.into_inner())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let members = MemberRepository::new(self.db.clone())
            .list_with_users(group_id)
            .await?
            .iter()
            .map(super::member::MemberWithUser::to_member_info)
            .collect();

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| ExpenseRecord {
                id: ExpenseId::new(e.id),
                paid_by: MemberId::new(e.paid_by),
                amount: e.amount,
                currency: e.currency,
            })
            .collect();

        let shares = ExpenseRepository::new(self.db.clone())
            .share_records(group_id)
            .await?;

        let settlements = settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group.id))
            .all(&self.db)
            .await?
            .iter()
            .map(to_settlement_record)
            .collect();

        Ok(Some(BalanceInputs {
            group: GroupInfo {
                id: GroupId::new(group.id),
                base_currency: group.base_currency,
            },
            members,
            expenses,
            shares,
            settlements,
        }))
    }
}
