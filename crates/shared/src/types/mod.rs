//! Common types used across the application.

pub mod currency;
pub mod id;
pub mod pagination;

pub use currency::{
    DEFAULT_CURRENCY, SUPPORTED_CURRENCIES, currency_or, is_supported_currency, normalize_currency,
};
pub use id::*;
pub use pagination::FeedLimit;
