//! Property-based tests for currency conversion.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::rates::{RateTable, convert, rate_between};

/// Amounts from 0.01 to 1,000,000.00 in cents.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Signed amounts, since balances can be negative.
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 1.0000 to 500.0000.
///
/// Round-tripping through a currency worth far more than the anchor loses
/// cents to rounding, so the lower bound stays at 1.
fn rate() -> impl Strategy<Value = Decimal> {
    (10_000i64..5_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn code() -> impl Strategy<Value = String> {
    "[A-Z]{3}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Same-currency conversion returns the input untouched for any table.
    #[test]
    fn prop_same_currency_is_identity(amount in signed_amount(), currency in code(), r in rate()) {
        let rates: RateTable = [("EUR", Decimal::ONE), ("USD", r)].into_iter().collect();
        prop_assert_eq!(convert(amount, &currency, &currency, &rates).unwrap(), amount);
        prop_assert_eq!(convert(amount, &currency, &currency, &RateTable::new()).unwrap(), amount);
    }

    /// Anchor -> B -> anchor lands within one cent of the start.
    #[test]
    fn prop_round_trip_within_a_cent(amount in amount(), r in rate()) {
        let rates: RateTable = [("EUR", Decimal::ONE), ("XTS", r)].into_iter().collect();
        let there = convert(amount, "EUR", "XTS", &rates).unwrap();
        let back = convert(there, "XTS", "EUR", &rates).unwrap();
        prop_assert!((back - amount).abs() <= Decimal::new(1, 2), "{} -> {} -> {}", amount, there, back);
    }

    /// Converted amounts carry at most two decimal places.
    #[test]
    fn prop_conversion_rounds_to_cents(amount in signed_amount(), a in rate(), b in rate()) {
        let rates: RateTable = [("AAA", a), ("BBB", b)].into_iter().collect();
        let result = convert(amount, "AAA", "BBB", &rates).unwrap();
        prop_assert_eq!(result, result.round_dp(2));
    }

    /// Conversion is symmetric in sign.
    #[test]
    fn prop_conversion_is_odd(amount in signed_amount(), r in rate()) {
        let rates: RateTable = [("XTS", r)].into_iter().collect();
        prop_assert_eq!(
            convert(-amount, "XTS", "EUR", &rates).unwrap(),
            -convert(amount, "XTS", "EUR", &rates).unwrap()
        );
    }

    /// The rate to a currency and back multiplies to one.
    #[test]
    fn prop_rate_between_inverse(a in rate(), b in rate()) {
        let rates: RateTable = [("AAA", a), ("BBB", b)].into_iter().collect();
        let forward = rate_between("AAA", "BBB", &rates).unwrap();
        let backward = rate_between("BBB", "AAA", &rates).unwrap();
        prop_assert!((forward * backward - Decimal::ONE).abs() < Decimal::new(1, 20));
    }
}
