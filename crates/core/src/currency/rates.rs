//! Exchange rate table and conversion.
//!
//! Rates are quoted against a single anchor currency: `rates["USD"] = 1.1`
//! means 1 EUR buys 1.1 USD. Any pair converts through the anchor.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

/// Currency every rate in a [`RateTable`] is expressed against.
pub const ANCHOR_CURRENCY: &str = "EUR";

/// Decimal places of every converted amount.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Errors raised when a rate table cannot serve a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// The table has no entry for a currency that is not the anchor.
    #[error("No exchange rate available for {0}")]
    MissingRate(String),

    /// The table holds a zero or negative rate.
    #[error("Exchange rate for {0} must be positive")]
    NonPositiveRate(String),
}

/// Snapshot of currency values relative to [`ANCHOR_CURRENCY`].
///
/// Backed by a `BTreeMap` so iteration and serialization order are stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<String, Decimal>);

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a table that only knows the anchor.
    #[must_use]
    pub fn anchored() -> Self {
        let mut table = Self::new();
        table.insert(ANCHOR_CURRENCY, Decimal::ONE);
        table
    }

    /// Static table served when the live feed and the cache are both unavailable.
    #[must_use]
    pub fn fallback() -> Self {
        [
            (ANCHOR_CURRENCY, Decimal::ONE),
            ("USD", dec!(1.1)),
            ("GBP", dec!(0.85)),
            ("JPY", dec!(130)),
        ]
        .into_iter()
        .collect()
    }

    /// Sets the rate for a currency, replacing any previous value.
    pub fn insert(&mut self, currency: &str, rate: Decimal) {
        self.0.insert(currency.to_string(), rate);
    }

    /// Returns the raw rate for a currency.
    #[must_use]
    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.0.get(currency).copied()
    }

    /// Returns true if the currency can be converted with this table.
    #[must_use]
    pub fn supports(&self, currency: &str) -> bool {
        currency == ANCHOR_CURRENCY || self.0.contains_key(currency)
    }

    /// Number of currencies in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(currency, rate)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Rate for a non-anchor currency, validated positive.
    fn rate_of(&self, currency: &str) -> Result<Decimal, CurrencyError> {
        if currency == ANCHOR_CURRENCY {
            return Ok(Decimal::ONE);
        }
        let rate = self
            .get(currency)
            .ok_or_else(|| CurrencyError::MissingRate(currency.to_string()))?;
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::NonPositiveRate(currency.to_string()));
        }
        Ok(rate)
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(c, r)| (c.into(), r)).collect())
    }
}

/// Rounds a monetary value to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount between two currencies through the anchor.
///
/// Same-currency conversion returns `amount` untouched. Otherwise the result
/// is rounded to cents.
///
/// # Errors
///
/// Returns `CurrencyError::MissingRate` if a non-anchor side is absent from
/// the table, or `CurrencyError::NonPositiveRate` for a degenerate entry.
pub fn convert(
    amount: Decimal,
    from_currency: &str,
    to_currency: &str,
    rates: &RateTable,
) -> Result<Decimal, CurrencyError> {
    if from_currency == to_currency {
        return Ok(amount);
    }

    let in_anchor = if from_currency == ANCHOR_CURRENCY {
        amount
    } else {
        amount / rates.rate_of(from_currency)?
    };

    let converted = if to_currency == ANCHOR_CURRENCY {
        in_anchor
    } else {
        in_anchor * rates.rate_of(to_currency)?
    };

    Ok(round_money(converted))
}

/// Returns the unrounded factor that turns `from_currency` into `to_currency`.
///
/// Expenses and settlements persist this at creation so later conversions
/// stay stable after the live table moves.
///
/// # Errors
///
/// Same conditions as [`convert`].
pub fn rate_between(
    from_currency: &str,
    to_currency: &str,
    rates: &RateTable,
) -> Result<Decimal, CurrencyError> {
    if from_currency == to_currency {
        return Ok(Decimal::ONE);
    }
    let from = rates.rate_of(from_currency)?;
    let to = rates.rate_of(to_currency)?;
    Ok(to / from)
}
