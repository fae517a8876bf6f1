//! CSV export of a group's expenses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use spendbee_shared::types::ExpenseId;
use thiserror::Error;

use crate::currency::round_money;

/// Column headers, in order.
pub const CSV_HEADERS: [&str; 12] = [
    "expense_id",
    "description",
    "note",
    "amount",
    "currency",
    "exchange_rate",
    "base_currency",
    "paid_by",
    "created_at",
    "split_with",
    "shares",
    "have_attachments",
];

const MAX_SLUG_LEN: usize = 60;

/// Errors raised while writing the export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),

    /// The written bytes were not UTF-8.
    #[error("CSV output is not valid UTF-8")]
    Encoding,
}

/// One member's share of an exported expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportShare {
    /// Member label.
    pub member: String,
    /// Share amount.
    pub amount: Decimal,
}

/// One exported expense, with member names already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// Expense ID.
    pub expense_id: ExpenseId,
    /// Description.
    pub description: String,
    /// Optional note.
    pub note: Option<String>,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Expense currency.
    pub currency: String,
    /// Rate captured at creation, expense currency to base.
    pub exchange_rate: Decimal,
    /// Payer label.
    pub paid_by: String,
    /// Expense date.
    pub created_at: DateTime<Utc>,
    /// Shares in display order.
    pub shares: Vec<ExportShare>,
    /// Whether receipts or attachments are stored with the expense.
    pub has_attachments: bool,
}

/// Writes `rows` as CSV with a header line.
///
/// Rows are written in the given order (callers pass newest first).
///
/// # Errors
///
/// Returns `ExportError` if the writer fails.
pub fn write_expenses_csv(base_currency: &str, rows: &[ExportRow]) -> Result<String, ExportError> {
    let mut writer = ::csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for row in rows {
        let split_with = row
            .shares
            .iter()
            .map(|s| s.member.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let shares = row
            .shares
            .iter()
            .map(|s| format!("{}: {:.2}", s.member, round_money(s.amount)))
            .collect::<Vec<_>>()
            .join("; ");

        writer.write_record([
            row.expense_id.to_string(),
            row.description.clone(),
            row.note.clone().unwrap_or_default(),
            format!("{:.2}", round_money(row.amount)),
            row.currency.clone(),
            format!(
                "{:.4}",
                row.exchange_rate
                    .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            ),
            base_currency.to_string(),
            row.paid_by.clone(),
            row.created_at.format("%d/%m/%Y, %H:%M").to_string(),
            split_with,
            shares,
            row.has_attachments.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

/// Lowercases `name` and collapses every non-alphanumeric run into `-`.
///
/// Leading and trailing dashes are dropped and the result is capped at 60
/// characters; an empty result becomes `"group"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "group".to_string()
    } else {
        slug.to_string()
    }
}

/// `expenses-<slug>-<YYYY-MM-DD>.csv`.
#[must_use]
pub fn export_filename(group_name: &str, date: NaiveDate) -> String {
    format!("expenses-{}-{}.csv", slugify(group_name), date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn row() -> ExportRow {
        ExportRow {
            expense_id: ExpenseId::new(12),
            description: "Dinner, drinks".into(),
            note: Some("said \"thanks\"".into()),
            amount: dec!(90),
            currency: "USD".into(),
            exchange_rate: dec!(0.923456),
            paid_by: "Ana".into(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 3, 19, 5, 0).unwrap(),
            shares: vec![
                ExportShare { member: "Ana".into(), amount: dec!(45) },
                ExportShare { member: "Bo (guest)".into(), amount: dec!(45) },
            ],
            has_attachments: false,
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = write_expenses_csv("EUR", &[]).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADERS.join(",")));
    }

    #[test]
    fn test_row_quoting_and_formatting() {
        let csv = write_expenses_csv("EUR", &[row()]).unwrap();
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "12,\"Dinner, drinks\",\"said \"\"thanks\"\"\",90.00,USD,0.9235,EUR,Ana,\"03/10/2026, 19:05\",Ana; Bo (guest),Ana: 45.00; Bo (guest): 45.00,false"
        );
    }

    #[test]
    fn test_parses_back_with_csv_reader() {
        let csv = write_expenses_csv("EUR", &[row(), row()]).unwrap();
        let mut reader = ::csv::Reader::from_reader(csv.as_bytes());
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Dinner, drinks");
        assert_eq!(&records[0][11], "false");
    }

    #[rstest]
    #[case("Trip to Lisbon!", "trip-to-lisbon")]
    #[case("  --Flat 3B-- ", "flat-3b")]
    #[case("Ünïcode Crew", "n-code-crew")]
    #[case("!!!", "group")]
    #[case("", "group")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn test_slug_is_capped() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 60);
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(export_filename("Trip", date), "expenses-trip-2026-10-16.csv");
    }
}
