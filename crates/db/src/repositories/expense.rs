//! Expense repository: expenses with their shares, written together with
//! the matching activity entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use spendbee_core::activity::{ActivityKind, ActivityMetadata};
use spendbee_core::balance::ShareRecord;
use spendbee_core::expense::ShareAllocation;
use spendbee_core::export::{ExportRow, ExportShare};
use spendbee_shared::types::{ExpenseId, GroupId, MemberId};

use super::activity::{NewActivity, insert_activity};
use crate::entities::{expense_shares, expenses};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseRepoError {
    /// Expense not found.
    #[error("Expense not found: {0}")]
    NotFound(ExpenseId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Owning group.
    pub group_id: GroupId,
    /// Membership of the user recording the expense.
    pub actor: MemberId,
    /// Description.
    pub description: String,
    /// Optional note.
    pub note: Option<String>,
    /// Total amount.
    pub amount: Decimal,
    /// Normalized currency code.
    pub currency: String,
    /// Expense currency to group base currency, at creation time.
    pub exchange_rate: Decimal,
    /// Paying member.
    pub paid_by: MemberId,
    /// Expense date; now if unset.
    pub created_at: Option<DateTime<Utc>>,
    /// Validated shares.
    pub shares: Vec<ShareAllocation>,
    /// Itemized receipt lines.
    pub receipt_items: Option<serde_json::Value>,
    /// Attachment metadata.
    pub attachments: Option<serde_json::Value>,
}

/// Fields to change on an expense. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New description.
    pub description: Option<String>,
    /// New note; `Some(None)` clears it.
    pub note: Option<Option<String>>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// Rate for the new currency.
    pub exchange_rate: Option<Decimal>,
    /// New payer.
    pub paid_by: Option<MemberId>,
    /// New date.
    pub created_at: Option<DateTime<Utc>>,
    /// Replacement shares; existing shares are dropped when set.
    pub shares: Option<Vec<ShareAllocation>>,
}

/// An expense with its shares.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseWithShares {
    /// Expense row.
    pub expense: expenses::Model,
    /// Share rows, in insertion order.
    pub shares: Vec<expense_shares::Model>,
}

impl ExpenseWithShares {
    /// Builds an export row, labeling members through `label`.
    pub fn to_export_row(
        &self,
        base_currency: &str,
        label: impl Fn(MemberId) -> String,
    ) -> ExportRow {
        let e = &self.expense;
        ExportRow {
            expense_id: ExpenseId::new(e.id),
            description: e.description.clone(),
            note: e.note.clone(),
            amount: e.amount,
            currency: e.currency.clone().unwrap_or_else(|| base_currency.to_string()),
            exchange_rate: e.exchange_rate,
            paid_by: label(MemberId::new(e.paid_by)),
            created_at: e.created_at.with_timezone(&Utc),
            shares: self
                .shares
                .iter()
                .map(|s| ExportShare {
                    member: label(MemberId::new(s.member_id)),
                    amount: s.share,
                })
                .collect(),
            has_attachments: e.receipt_image_url.is_some() || has_entries(e.attachments.as_ref()),
        }
    }
}

fn has_entries(value: Option<&serde_json::Value>) -> bool {
    value.and_then(serde_json::Value::as_array).is_some_and(|a| !a.is_empty())
}

fn metadata(description: &str, note: Option<&str>) -> ActivityMetadata {
    ActivityMetadata {
        description: Some(description.to_string()),
        note: note.map(str::to_string),
    }
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts an expense, its shares and an `expense_created` activity in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is persisted then.
    pub async fn create(&self, input: CreateExpenseInput) -> Result<ExpenseWithShares, DbErr> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let txn = self.db.begin().await?;

        let expense = expenses::ActiveModel {
            group_id: Set(input.group_id.into_inner()),
            description: Set(input.description.clone()),
            note: Set(input.note.clone()),
            amount: Set(input.amount),
            currency: Set(Some(input.currency.clone())),
            exchange_rate: Set(input.exchange_rate),
            paid_by: Set(input.paid_by.into_inner()),
            receipt_image_url: Set(None),
            receipt_items: Set(input.receipt_items),
            attachments: Set(input.attachments),
            created_at: Set(created_at.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut shares = Vec::with_capacity(input.shares.len());
        for allocation in &input.shares {
            let share = expense_shares::ActiveModel {
                expense_id: Set(expense.id),
                member_id: Set(allocation.member_id.into_inner()),
                share: Set(allocation.amount),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            shares.push(share);
        }

        insert_activity(
            &txn,
            NewActivity {
                group_id: input.group_id,
                actor: input.actor,
                kind: ActivityKind::ExpenseCreated,
                expense_id: Some(ExpenseId::new(expense.id)),
                settlement_id: None,
                from: None,
                to: None,
                amount: Some(input.amount),
                currency: Some(input.currency),
                metadata: metadata(&input.description, input.note.as_deref()),
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            expense_id = expense.id,
            group_id = expense.group_id,
            amount = %expense.amount,
            shares = shares.len(),
            "Expense created"
        );
        Ok(ExpenseWithShares { expense, shares })
    }

    /// Finds an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: ExpenseId) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Shares of one expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn shares_of(&self, id: ExpenseId) -> Result<Vec<expense_shares::Model>, DbErr> {
        expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.eq(id.into_inner()))
            .order_by_asc(expense_shares::Column::Id)
            .all(&self.db)
            .await
    }

    /// Lists a group's expenses with shares, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_group(&self, group_id: GroupId) -> Result<Vec<ExpenseWithShares>, DbErr> {
        let expenses = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.into_inner()))
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .all(&self.db)
            .await?;
        if expenses.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = expenses.iter().map(|e| e.id).collect();
        let mut by_expense: HashMap<i32, Vec<expense_shares::Model>> = HashMap::new();
        for share in expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.is_in(ids))
            .order_by_asc(expense_shares::Column::Id)
            .all(&self.db)
            .await?
        {
            by_expense.entry(share.expense_id).or_default().push(share);
        }

        Ok(expenses
            .into_iter()
            .map(|expense| {
                let shares = by_expense.remove(&expense.id).unwrap_or_default();
                ExpenseWithShares { expense, shares }
            })
            .collect())
    }

    /// Share rows of every expense in a group, as balance inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn share_records(&self, group_id: GroupId) -> Result<Vec<ShareRecord>, DbErr> {
        let rows = expense_shares::Entity::find()
            .inner_join(expenses::Entity)
            .filter(expenses::Column::GroupId.eq(group_id.into_inner()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|s| ShareRecord {
                expense_id: ExpenseId::new(s.expense_id),
                member_id: MemberId::new(s.member_id),
                share: s.share,
            })
            .collect())
    }

    /// Applies an update, replaces shares when given, and records an
    /// `expense_updated` activity, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseRepoError::NotFound` if the expense is gone, or a
    /// database error.
    pub async fn update(
        &self,
        id: ExpenseId,
        actor: MemberId,
        input: UpdateExpenseInput,
    ) -> Result<ExpenseWithShares, ExpenseRepoError> {
        let txn = self.db.begin().await?;

        let current = expenses::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(ExpenseRepoError::NotFound(id))?;

        let mut expense: expenses::ActiveModel = current.into();
        if let Some(description) = input.description {
            expense.description = Set(description);
        }
        if let Some(note) = input.note {
            expense.note = Set(note);
        }
        if let Some(amount) = input.amount {
            expense.amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            expense.currency = Set(Some(currency));
        }
        if let Some(rate) = input.exchange_rate {
            expense.exchange_rate = Set(rate);
        }
        if let Some(paid_by) = input.paid_by {
            expense.paid_by = Set(paid_by.into_inner());
        }
        if let Some(created_at) = input.created_at {
            expense.created_at = Set(created_at.into());
        }
        let expense = expense.update(&txn).await?;

        if let Some(allocations) = input.shares {
            expense_shares::Entity::delete_many()
                .filter(expense_shares::Column::ExpenseId.eq(expense.id))
                .exec(&txn)
                .await?;
            for allocation in allocations {
                expense_shares::ActiveModel {
                    expense_id: Set(expense.id),
                    member_id: Set(allocation.member_id.into_inner()),
                    share: Set(allocation.amount),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        insert_activity(
            &txn,
            NewActivity {
                group_id: GroupId::new(expense.group_id),
                actor,
                kind: ActivityKind::ExpenseUpdated,
                expense_id: Some(id),
                settlement_id: None,
                from: None,
                to: None,
                amount: Some(expense.amount),
                currency: expense.currency.clone(),
                metadata: metadata(&expense.description, expense.note.as_deref()),
            },
        )
        .await?;

        let shares = expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.eq(expense.id))
            .order_by_asc(expense_shares::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(expense_id = expense.id, "Expense updated");
        Ok(ExpenseWithShares { expense, shares })
    }

    /// Deletes an expense and its shares, leaving an `expense_deleted`
    /// activity behind.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseRepoError::NotFound` if the expense is gone, or a
    /// database error.
    pub async fn delete(&self, id: ExpenseId, actor: MemberId) -> Result<(), ExpenseRepoError> {
        let txn = self.db.begin().await?;

        let expense = expenses::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(ExpenseRepoError::NotFound(id))?;

        insert_activity(
            &txn,
            NewActivity {
                group_id: GroupId::new(expense.group_id),
                actor,
                kind: ActivityKind::ExpenseDeleted,
                expense_id: None,
                settlement_id: None,
                from: None,
                to: None,
                amount: Some(expense.amount),
                currency: expense.currency.clone(),
                metadata: metadata(&expense.description, expense.note.as_deref()),
            },
        )
        .await?;

        expenses::Entity::delete_by_id(expense.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(expense_id = expense.id, group_id = expense.group_id, "Expense deleted");
        Ok(())
    }
}
