//! Credit-card statement parsing
//!
//! Normalizes an uploaded CSV statement into transaction records. Column
//! headers vary between issuers, so each required field is resolved
//! against a list of known synonyms; the first synonym present wins.
//! Rows that cannot be normalized are dropped, and the drop count is
//! surfaced alongside the accepted records.

use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Header synonyms for the transaction date column
const DATE_HEADERS: &[&str] = &["Date", "Transaction Date", "Posted Date", "date"];

/// Header synonyms for the description/merchant column
const DESCRIPTION_HEADERS: &[&str] = &[
    "Description",
    "Merchant",
    "Transaction Description",
    "description",
];

/// Header synonyms for the amount column
const AMOUNT_HEADERS: &[&str] = &["Amount", "Transaction Amount", "Debit", "Credit", "amount"];

/// A normalized statement transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: f64,
    pub description: String,
}

/// Parse result: accepted records plus the number of dropped rows
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub transactions: Vec<StatementTransaction>,
    pub skipped: usize,
}

/// Parse a CSV statement into normalized transactions.
///
/// Fails only when the header row is unreadable or lacks all three
/// required column families; individual bad rows are counted as skipped.
pub fn parse_csv_statement<R: Read>(reader: R) -> Result<ParsedStatement> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let header_names: Vec<&str> = headers.iter().collect();

    let date_col = find_column(&header_names, DATE_HEADERS);
    let desc_col = find_column(&header_names, DESCRIPTION_HEADERS);
    let amount_col = find_column(&header_names, AMOUNT_HEADERS);

    let (date_col, desc_col, amount_col) = match (date_col, desc_col, amount_col) {
        (Some(d), Some(m), Some(a)) => (d, m, a),
        _ => {
            return Err(Error::Statement(format!(
                "Unrecognized statement header: {}",
                header_names.join(",")
            )))
        }
    };

    let mut transactions = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let date = record.get(date_col).and_then(|s| parse_date(s));
        let description = record.get(desc_col).map(|s| s.trim().to_string());
        let amount = record.get(amount_col).and_then(|s| parse_amount(s));

        match (date, description, amount) {
            (Some(date), Some(description), Some(amount)) if !description.is_empty() => {
                transactions.push(StatementTransaction {
                    date,
                    merchant: description.clone(),
                    amount,
                    description,
                });
            }
            _ => skipped += 1,
        }
    }

    debug!(
        accepted = transactions.len(),
        skipped, "Parsed CSV statement"
    );

    Ok(ParsedStatement {
        transactions,
        skipped,
    })
}

/// Resolve a required column against its synonym list; first synonym
/// present in the header wins.
fn find_column(headers: &[&str], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
}

/// Try the known date formats in order; first success wins
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%m/%d/%Y", // 01/15/2024
        "%Y-%m-%d", // 2024-01-15
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

/// Parse an amount string: strip everything except digits, `.`, `-`,
/// then take the absolute value. Sign information is discarded.
pub(crate) fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned.parse::<f64>().ok().map(f64::abs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_simple_statement() {
        let csv = "Date,Description,Amount\n01/15/2024,Coffee Shop,4.50\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();

        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.transactions,
            vec![StatementTransaction {
                date: date(2024, 1, 15),
                merchant: "Coffee Shop".to_string(),
                amount: 4.50,
                description: "Coffee Shop".to_string(),
            }]
        );
    }

    #[test]
    fn header_synonyms_resolve() {
        let csv = "Transaction Date,Merchant,Transaction Amount\n2024-01-15,Diner,12.00\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].merchant, "Diner");
    }

    #[test]
    fn first_synonym_wins() {
        // Both "Date" and "Posted Date" present; "Date" is resolved first
        let csv = "Posted Date,Date,Description,Amount\n01/20/2024,01/15/2024,Shop,1.00\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions[0].date, date(2024, 1, 15));
    }

    #[test]
    fn currency_symbols_and_sign_stripped() {
        let csv = "Date,Description,Amount\n01/15/2024,Refund,\"-$1,234.50\"\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions[0].amount, 1234.50);
    }

    #[test]
    fn bad_rows_dropped_not_fatal() {
        let csv = "Date,Description,Amount\n\
                   not-a-date,Shop,1.00\n\
                   01/15/2024,Shop,not-a-number\n\
                   01/16/2024,Shop,2.50\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.transactions[0].amount, 2.50);
    }

    #[test]
    fn row_missing_amount_column_dropped() {
        let csv = "Date,Description,Amount\n01/15/2024,Shop\n";
        let parsed = parse_csv_statement(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 0);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn unrecognized_header_is_fatal() {
        let csv = "Foo,Bar,Baz\n1,2,3\n";
        assert!(parse_csv_statement(csv.as_bytes()).is_err());
    }

    #[test]
    fn date_formats_tried_in_order() {
        assert_eq!(parse_date("01/15/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01-15-2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("Jan 15 2024"), None);
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-123.45"), Some(123.45));
        assert_eq!(parse_amount("  4.50 "), Some(4.50));
        assert_eq!(parse_amount("n/a"), None);
    }
}
