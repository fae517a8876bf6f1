//! Multi-currency handling and exchange rates.
//!
//! - `rates` - rate table, conversion and rate snapshots
//! - `provider` - cached provider with pluggable source and clock
//! - `ecb` - ECB daily reference-rate feed

pub mod ecb;
pub mod provider;
pub mod rates;

#[cfg(test)]
mod props;

pub use ecb::{EcbRateSource, parse_ecb_daily_xml};
pub use provider::{
    Clock, DEFAULT_REFRESH_INTERVAL, ExchangeRateProvider, RateCache, RateFetchError, RateSource,
    SystemClock,
};
pub use rates::{
    ANCHOR_CURRENCY, CurrencyError, MONEY_DECIMAL_PLACES, RateTable, convert, rate_between,
    round_money,
};
