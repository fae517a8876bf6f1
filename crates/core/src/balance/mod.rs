//! Group balance computation.
//!
//! - `aggregator` - per-member net positions in every currency and in base
//! - `suggestions` - minimal "settle up" transfer plan
//! - `types` - records consumed and reports produced

pub mod aggregator;
pub mod error;
pub mod suggestions;
pub mod types;

#[cfg(test)]
mod props;

pub use aggregator::{NEGLIGIBLE_AMOUNT, compute_balances};
pub use error::BalanceError;
pub use suggestions::suggest_settlements;
pub use types::{
    CurrencyAmount, ExpenseRecord, GroupInfo, MemberBalance, MemberInfo, SettlementRecord,
    ShareRecord, SuggestedTransfer,
};
