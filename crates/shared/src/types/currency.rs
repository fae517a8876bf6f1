//! Currency codes.
//!
//! Every layer that reads a currency from a request or a row goes through
//! [`normalize_currency`], so the `"EUR"` fallback lives in exactly one place.

/// Currency used whenever a group, expense, or settlement has none set.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// ISO 4217 codes a group may choose as its base currency.
pub const SUPPORTED_CURRENCIES: [&str; 30] = [
    "EUR", "USD", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "SEK", "NOK", "DKK", "PLN", "CZK",
    "HUF", "RON", "BGN", "HRK", "RUB", "TRY", "BRL", "CNY", "INR", "IDR", "KRW", "MXN", "MYR",
    "PHP", "SGD", "THB", "ZAR",
];

/// Normalizes an optional currency code.
///
/// Trims and upper-cases the input; `None` or blank input yields
/// [`DEFAULT_CURRENCY`].
#[must_use]
pub fn normalize_currency(code: Option<&str>) -> String {
    currency_or(code, DEFAULT_CURRENCY)
}

/// Normalizes an optional currency code, using `fallback` when it is unset.
///
/// Rows that carry no currency of their own inherit their group's base
/// currency through this.
#[must_use]
pub fn currency_or(code: Option<&str>, fallback: &str) -> String {
    match code.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_ascii_uppercase(),
        _ => fallback.to_string(),
    }
}

/// Returns true if the code is in [`SUPPORTED_CURRENCIES`] (case-sensitive).
#[must_use]
pub fn is_supported_currency(code: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "EUR")]
    #[case(Some(""), "EUR")]
    #[case(Some("   "), "EUR")]
    #[case(Some("usd"), "USD")]
    #[case(Some(" gbp "), "GBP")]
    #[case(Some("JPY"), "JPY")]
    fn test_normalize_currency(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(normalize_currency(input), expected);
    }

    #[test]
    fn test_currency_or_uses_fallback() {
        assert_eq!(currency_or(None, "USD"), "USD");
        assert_eq!(currency_or(Some(" "), "GBP"), "GBP");
        assert_eq!(currency_or(Some("jpy"), "GBP"), "JPY");
    }

    #[test]
    fn test_supported_currencies() {
        assert!(is_supported_currency("EUR"));
        assert!(is_supported_currency("ZAR"));
        assert!(!is_supported_currency("XXX"));
        assert!(!is_supported_currency("eur"));
    }

    #[test]
    fn test_default_currency_is_supported() {
        assert!(is_supported_currency(DEFAULT_CURRENCY));
    }
}
