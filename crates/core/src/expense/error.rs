//! Expense and settlement validation errors.

use rust_decimal::Decimal;
use spendbee_shared::types::MemberId;
use thiserror::Error;

/// Errors raised while validating an expense or a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseError {
    /// Description is missing or blank.
    #[error("Description is required")]
    EmptyDescription,

    /// Amount is zero or negative.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// An amount or share has more than two decimal places.
    #[error("Amount {0} has more than 2 decimal places")]
    TooPrecise(Decimal),

    /// Nobody shares the expense.
    #[error("An expense must be shared with at least one member")]
    NoParticipants,

    /// The expense is dated after now.
    #[error("Expense date cannot be in the future")]
    FutureDate,

    /// The currency code is not one the service converts.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// A referenced member does not belong to the group.
    #[error("Member {0} is not part of this group")]
    NotAGroupMember(MemberId),

    /// The same member appears twice in a split.
    #[error("Member {0} appears more than once in the split")]
    DuplicateParticipant(MemberId),

    /// A custom share is negative.
    #[error("Share for member {0} cannot be negative")]
    NegativeShare(MemberId),

    /// Custom shares do not add up to the expense amount.
    #[error("Custom shares must add up to the total amount ({total} != {amount})")]
    SharesMismatch {
        /// Sum of the provided shares.
        total: Decimal,
        /// Expense amount.
        amount: Decimal,
    },

    /// A settlement names the same member on both sides.
    #[error("A member cannot settle with themselves")]
    SelfSettlement,
}
