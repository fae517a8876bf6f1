//! Expense splitting and input validation.

pub mod error;
pub mod split;
pub mod validation;

pub use error::ExpenseError;
pub use split::{
    CustomShare, SHARE_TOLERANCE, ShareAllocation, is_cent_precise, resolve_shares, split_equally,
};
pub use validation::{ExpenseDraft, validate_expense, validate_settlement};
