//! Validation of expense and settlement input against a group.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use spendbee_shared::types::{MemberId, is_supported_currency};

use super::error::ExpenseError;
use super::split::{CustomShare, ShareAllocation, is_cent_precise, resolve_shares};

/// Expense fields after defaults have been applied by the caller.
#[derive(Debug, Clone)]
pub struct ExpenseDraft<'a> {
    /// Short description.
    pub description: &'a str,
    /// Total amount.
    pub amount: Decimal,
    /// Normalized currency code.
    pub currency: &'a str,
    /// Explicit expense date, if the user backdated it.
    pub created_at: Option<DateTime<Utc>>,
    /// Paying member.
    pub paid_by: MemberId,
    /// Members sharing the expense equally.
    pub shared_with: &'a [MemberId],
    /// Explicit shares; takes precedence over `shared_with`.
    pub custom_shares: &'a [CustomShare],
}

/// Checks an expense draft and resolves its shares.
///
/// `group_members` is the full member list of the expense's group; `now` is
/// the request time.
///
/// # Errors
///
/// Returns the first [`ExpenseError`] found.
pub fn validate_expense(
    draft: &ExpenseDraft<'_>,
    group_members: &[MemberId],
    now: DateTime<Utc>,
) -> Result<Vec<ShareAllocation>, ExpenseError> {
    if draft.description.trim().is_empty() {
        return Err(ExpenseError::EmptyDescription);
    }
    validate_amount(draft.amount)?;
    validate_currency(draft.currency)?;

    if draft.created_at.is_some_and(|at| at > now) {
        return Err(ExpenseError::FutureDate);
    }

    ensure_member(draft.paid_by, group_members)?;

    let shares = resolve_shares(draft.amount, draft.shared_with, draft.custom_shares)?;
    for share in &shares {
        ensure_member(share.member_id, group_members)?;
    }
    Ok(shares)
}

/// Checks a settlement between two members of a group.
///
/// # Errors
///
/// Returns `SelfSettlement`, `NonPositiveAmount`, `TooPrecise`,
/// `UnsupportedCurrency` or `NotAGroupMember`.
pub fn validate_settlement(
    from: MemberId,
    to: MemberId,
    amount: Decimal,
    currency: &str,
    group_members: &[MemberId],
) -> Result<(), ExpenseError> {
    if from == to {
        return Err(ExpenseError::SelfSettlement);
    }
    validate_amount(amount)?;
    validate_currency(currency)?;
    ensure_member(from, group_members)?;
    ensure_member(to, group_members)
}

/// Amounts are stored as whole cents, so anything finer is refused rather
/// than rounded.
fn validate_amount(amount: Decimal) -> Result<(), ExpenseError> {
    if amount <= Decimal::ZERO {
        return Err(ExpenseError::NonPositiveAmount);
    }
    if !is_cent_precise(amount) {
        return Err(ExpenseError::TooPrecise(amount));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<(), ExpenseError> {
    if !is_supported_currency(currency) {
        return Err(ExpenseError::UnsupportedCurrency(currency.to_string()));
    }
    Ok(())
}

fn ensure_member(id: MemberId, group_members: &[MemberId]) -> Result<(), ExpenseError> {
    if group_members.contains(&id) {
        Ok(())
    } else {
        Err(ExpenseError::NotAGroupMember(id))
    }
}
