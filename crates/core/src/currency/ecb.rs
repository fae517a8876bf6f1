//! European Central Bank daily reference-rate feed.
//!
//! The feed is a small XML document whose leaf elements look like
//! `<Cube currency='USD' rate='1.0823'/>`. Every rate is quoted against EUR,
//! which matches [`ANCHOR_CURRENCY`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::{Reader, events::Event};
use rust_decimal::Decimal;

use super::provider::{RateFetchError, RateSource};
use super::rates::{ANCHOR_CURRENCY, RateTable};

/// Parses the ECB `eurofxref-daily.xml` document into a rate table.
///
/// The anchor is always present with rate 1. Cube elements with a missing
/// attribute, a code that is not three uppercase letters, or a rate that is
/// not a positive decimal are skipped.
///
/// # Errors
///
/// Returns `RateFetchError::Parse` on malformed XML and
/// `RateFetchError::Empty` if the document carries no usable rate.
pub fn parse_ecb_daily_xml(xml: &str) -> Result<RateTable, RateFetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut table = RateTable::anchored();
    let mut found = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"Cube" => {
                let mut currency = None;
                let mut rate = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|err| RateFetchError::Parse(err.to_string()))?;
                    match attr.key.as_ref() {
                        b"currency" => currency = Some(value.into_owned()),
                        b"rate" => rate = Decimal::from_str(value.trim()).ok(),
                        _ => {}
                    }
                }

                if let (Some(code), Some(rate)) = (currency, rate) {
                    if is_currency_code(&code) && rate > Decimal::ZERO && code != ANCHOR_CURRENCY
                    {
                        table.insert(&code, rate);
                        found += 1;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(RateFetchError::Parse(format!(
                    "at position {}: {err}",
                    reader.error_position()
                )));
            }
        }
    }

    if found == 0 {
        return Err(RateFetchError::Empty);
    }
    Ok(table)
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// [`RateSource`] backed by the ECB feed over HTTPS.
#[derive(Debug, Clone)]
pub struct EcbRateSource {
    client: reqwest::Client,
    url: String,
}

impl EcbRateSource {
    /// Builds a source for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RateFetchError::Http` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RateFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spendbee/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RateFetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Feed URL this source reads from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for EcbRateSource {
    async fn fetch(&self) -> Result<RateTable, RateFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateFetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateFetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RateFetchError::Http(e.to_string()))?;

        let table = parse_ecb_daily_xml(&body)?;
        tracing::debug!(url = %self.url, currencies = table.len(), "Fetched ECB reference rates");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
	<gesmes:subject>Reference rates</gesmes:subject>
	<gesmes:Sender>
		<gesmes:name>European Central Bank</gesmes:name>
	</gesmes:Sender>
	<Cube>
		<Cube time='2026-10-16'>
			<Cube currency='USD' rate='1.0823'/>
			<Cube currency='JPY' rate='161.42'/>
			<Cube currency='GBP' rate='0.84120'/>
			<Cube currency='CHF' rate='0.9375'/>
		</Cube>
	</Cube>
</gesmes:Envelope>"#;

    #[test]
    fn test_parse_sample_feed() {
        let table = parse_ecb_daily_xml(SAMPLE).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.get("EUR"), Some(Decimal::ONE));
        assert_eq!(table.get("USD"), Some(dec!(1.0823)));
        assert_eq!(table.get("JPY"), Some(dec!(161.42)));
        assert_eq!(table.get("GBP"), Some(dec!(0.84120)));
        assert_eq!(table.get("CHF"), Some(dec!(0.9375)));
    }

    #[test]
    fn test_double_quoted_attributes() {
        let xml = r#"<Cube><Cube currency="SEK" rate="11.2"/></Cube>"#;
        let table = parse_ecb_daily_xml(xml).unwrap();
        assert_eq!(table.get("SEK"), Some(dec!(11.2)));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let xml = r#"<Cube>
            <Cube currency='usd' rate='1.1'/>
            <Cube currency='NOK' rate='abc'/>
            <Cube currency='PLN' rate='-4.3'/>
            <Cube currency='HUF'/>
            <Cube currency='CZK' rate='25.1'/>
        </Cube>"#;
        let table = parse_ecb_daily_xml(xml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("CZK"), Some(dec!(25.1)));
        assert!(!table.supports("NOK"));
    }

    #[test]
    fn test_document_without_rates_is_empty() {
        let xml = "<Cube><Cube time='2026-10-16'></Cube></Cube>";
        assert!(matches!(
            parse_ecb_daily_xml(xml),
            Err(RateFetchError::Empty)
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let xml = "<Cube><Cube currency='USD' rate='1.1'/></Envelope>";
        assert!(matches!(
            parse_ecb_daily_xml(xml),
            Err(RateFetchError::Parse(_))
        ));
    }

    #[test]
    fn test_source_keeps_url() {
        let source = EcbRateSource::new("http://localhost/rates.xml", Duration::from_secs(1)).unwrap();
        assert_eq!(source.url(), "http://localhost/rates.xml");
    }
}
