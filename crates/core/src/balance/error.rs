//! Balance computation errors.

use spendbee_shared::types::ExpenseId;
use thiserror::Error;

use crate::currency::CurrencyError;

/// Errors that stop a balance computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// A currency in the group's records cannot be converted.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// A share points at an expense that was not supplied.
    #[error("Share references unknown expense {0}")]
    UnknownExpense(ExpenseId),
}
