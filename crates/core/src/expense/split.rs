//! Splitting an expense amount into per-member shares.
//!
//! Equal splits use the largest remainder method at cent precision, so the
//! shares always add up to the amount exactly.

use std::collections::HashSet;

use rust_decimal::prelude::*;
use serde::Deserialize;
use spendbee_shared::types::MemberId;

use super::error::ExpenseError;
use crate::currency::MONEY_DECIMAL_PLACES;

/// Largest gap allowed between the sum of custom shares and the amount.
pub const SHARE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Whether `value` fits in cents without rounding.
#[must_use]
pub fn is_cent_precise(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_DECIMAL_PLACES
}

/// A caller-provided share.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomShare {
    /// Member owing the share.
    pub member_id: MemberId,
    /// Amount owed.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// A resolved share ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareAllocation {
    /// Member owing the share.
    pub member_id: MemberId,
    /// Amount owed.
    pub amount: Decimal,
}

/// Splits `total` into `count` cent-precise parts that sum exactly to the
/// rounded total.
///
/// Leftover cents go to the first recipients, one each.
///
/// ```
/// use rust_decimal_macros::dec;
/// use spendbee_core::expense::split_equally;
///
/// assert_eq!(split_equally(dec!(100), 3), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
/// ```
#[must_use]
pub fn split_equally(total: Decimal, count: usize) -> Vec<Decimal> {
    if count == 0 {
        return vec![];
    }

    let total = total.round_dp_with_strategy(
        MONEY_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    );
    let count_dec = Decimal::from(count as u64);
    let unit = Decimal::new(1, MONEY_DECIMAL_PLACES);

    let base = (total / count_dec)
        .round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::ToZero);
    let remainder = total - base * count_dec;

    let extra = (remainder / unit)
        .trunc()
        .to_usize()
        .unwrap_or(0);

    (0..count)
        .map(|i| if i < extra { base + unit } else { base })
        .collect()
}

/// Resolves the shares of an expense.
///
/// With `custom` non-empty the custom amounts are used as given; they must
/// be non-negative whole cents, name each member once, and add up to
/// `amount` within [`SHARE_TOLERANCE`]. Otherwise `amount` is split equally over
/// `shared_with` in the given order.
///
/// # Errors
///
/// Returns `ExpenseError::NoParticipants`, `DuplicateParticipant`,
/// `NegativeShare`, `TooPrecise` or `SharesMismatch` accordingly.
pub fn resolve_shares(
    amount: Decimal,
    shared_with: &[MemberId],
    custom: &[CustomShare],
) -> Result<Vec<ShareAllocation>, ExpenseError> {
    if !custom.is_empty() {
        return resolve_custom(amount, custom);
    }

    if shared_with.is_empty() {
        return Err(ExpenseError::NoParticipants);
    }
    ensure_unique(shared_with.iter().copied())?;

    Ok(shared_with
        .iter()
        .zip(split_equally(amount, shared_with.len()))
        .map(|(member_id, amount)| ShareAllocation {
            member_id: *member_id,
            amount,
        })
        .collect())
}

fn resolve_custom(
    amount: Decimal,
    custom: &[CustomShare],
) -> Result<Vec<ShareAllocation>, ExpenseError> {
    ensure_unique(custom.iter().map(|s| s.member_id))?;

    if let Some(negative) = custom.iter().find(|s| s.amount < Decimal::ZERO) {
        return Err(ExpenseError::NegativeShare(negative.member_id));
    }
    if let Some(fractional) = custom.iter().find(|s| !is_cent_precise(s.amount)) {
        return Err(ExpenseError::TooPrecise(fractional.amount));
    }

    let total: Decimal = custom.iter().map(|s| s.amount).sum();
    if (total - amount).abs() > SHARE_TOLERANCE {
        return Err(ExpenseError::SharesMismatch { total, amount });
    }

    Ok(custom
        .iter()
        .map(|s| ShareAllocation {
            member_id: s.member_id,
            amount: s.amount,
        })
        .collect())
}

fn ensure_unique(ids: impl Iterator<Item = MemberId>) -> Result<(), ExpenseError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ExpenseError::DuplicateParticipant(id));
        }
    }
    Ok(())
}
