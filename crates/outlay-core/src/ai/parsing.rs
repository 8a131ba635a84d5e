//! Parsing and validation of model responses
//!
//! Model replies often wrap the JSON payload in prose, so the JSON span
//! is cut out before deserializing. Extracted receipt fields are then
//! clamped into the shapes the rest of the system relies on — the model
//! output is never trusted as-is.

use chrono::NaiveDate;
use serde_json::Value;

use super::types::{ExtractedReceipt, FALLBACK_CATEGORY, UNKNOWN_MERCHANT};
use crate::error::{Error, Result};
use crate::models::DEFAULT_CATEGORIES;
use crate::statement::StatementTransaction;

/// Cut the first `{` … last `}` span out of a response
pub fn extract_json_object(response: &str) -> Result<Value> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                let truncated = if json_str.len() > 200 {
                    format!("{}...", &json_str[..200])
                } else {
                    json_str.to_string()
                };
                Error::InvalidData(format!("Invalid JSON from model: {} | Raw: {}", e, truncated))
            })
        }
        _ => Err(Error::InvalidData(
            "No JSON object found in model response".into(),
        )),
    }
}

/// Cut the first `[` … last `]` span out of a response
pub fn extract_json_array(response: &str) -> Result<Value> {
    let response = response.trim();
    let start = response.find('[');
    let end = response.rfind(']');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str)
                .map_err(|e| Error::InvalidData(format!("Invalid JSON array from model: {}", e)))
        }
        _ => Err(Error::InvalidData(
            "No JSON array found in model response".into(),
        )),
    }
}

/// Parse and clamp a receipt-extraction response
pub fn parse_receipt_response(response: &str, today: NaiveDate) -> Result<ExtractedReceipt> {
    let value = extract_json_object(response)?;
    Ok(validate_extracted(&value, today))
}

/// Clamp raw extracted JSON into a valid field set:
/// merchant defaults, non-negative amount, ISO date with today fallback,
/// closed category set, confidence clamped into [0, 1].
pub fn validate_extracted(data: &Value, today: NaiveDate) -> ExtractedReceipt {
    let merchant = data
        .get("merchant")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_MERCHANT)
        .to_string();

    let amount = data
        .get("amount")
        .and_then(coerce_amount)
        .map(|a| a.max(0.0))
        .unwrap_or(0.0);

    let date = data
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .unwrap_or(today);

    let items = data
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let category = data
        .get("category")
        .and_then(Value::as_str)
        .map(|c| normalize_category(c))
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

    let confidence = data
        .get("confidence")
        .and_then(coerce_amount)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    ExtractedReceipt {
        merchant,
        amount,
        date,
        items,
        category,
        tax: data.get("tax").and_then(coerce_amount),
        tip: data.get("tip").and_then(coerce_amount),
        payment_method: optional_string(data, "payment_method"),
        address: optional_string(data, "address"),
        phone: optional_string(data, "phone"),
        confidence,
        error: None,
    }
}

/// Collapse a suggested category into the closed set
pub fn normalize_category(category: &str) -> String {
    let category = category.trim();
    DEFAULT_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

/// Parse a statement-extraction response; entries whose date, merchant,
/// or amount cannot be coerced are skipped.
pub fn parse_transactions_response(response: &str) -> Result<Vec<StatementTransaction>> {
    let value = extract_json_array(response)?;
    let entries = value
        .as_array()
        .ok_or_else(|| Error::InvalidData("Expected a JSON array of transactions".into()))?;

    let mut transactions = Vec::new();
    for entry in entries {
        let date = entry
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        let merchant = entry
            .get("merchant")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let amount = entry.get("amount").and_then(coerce_amount);

        if let (Some(date), Some(merchant), Some(amount)) = (date, merchant, amount) {
            let description = entry
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .unwrap_or_else(|| merchant.clone());
            transactions.push(StatementTransaction {
                date,
                merchant,
                amount: amount.abs(),
                description,
            });
        }
    }

    Ok(transactions)
}

/// Parse a categorization response against the available category names
pub fn parse_category_response(response: &str, categories: &[String]) -> String {
    let name = response.trim().trim_matches('"').trim();
    if categories.iter().any(|c| c == name) {
        name.to_string()
    } else {
        FALLBACK_CATEGORY.to_string()
    }
}

/// Split an insights response into at most five one-line insights,
/// stripping list markers.
pub fn parse_insights_response(response: &str) -> Vec<String> {
    response
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(5)
        .collect()
}

/// Coerce a JSON number or a currency string ("$1,234.50") to f64
fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.replace(['$', ','], "");
            cleaned.trim().parse::<f64>().ok()
        }
        _ => None,
    }
}

fn optional_string(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let response = r#"Here is the data: {"merchant": "Cafe"} hope it helps"#;
        let value = extract_json_object(response).unwrap();
        assert_eq!(value["merchant"], "Cafe");
    }

    #[test]
    fn no_json_is_an_error() {
        assert!(extract_json_object("no structured data here").is_err());
    }

    #[test]
    fn amount_string_with_currency_coerced() {
        let data = serde_json::json!({"merchant": "Cafe", "amount": "$1,234.50"});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.amount, 1234.5);
    }

    #[test]
    fn negative_amount_clamped_to_zero() {
        let data = serde_json::json!({"amount": -5.0});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.amount, 0.0);
    }

    #[test]
    fn missing_merchant_gets_placeholder() {
        let data = serde_json::json!({"amount": 1.0});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.merchant, UNKNOWN_MERCHANT);
    }

    #[test]
    fn invalid_date_falls_back_to_today() {
        let data = serde_json::json!({"date": "June 1st"});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.date, today());
    }

    #[test]
    fn unknown_category_collapses_to_other() {
        let data = serde_json::json!({"category": "Groceries"});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.category, "Other");
    }

    #[test]
    fn known_category_preserved() {
        let data = serde_json::json!({"category": "Meals Dining"});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.category, "Meals Dining");
    }

    #[test]
    fn confidence_clamped() {
        let data = serde_json::json!({"confidence": 1.5});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.confidence, 1.0);

        let data = serde_json::json!({"confidence": -0.5});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.confidence, 0.0);
    }

    #[test]
    fn missing_confidence_defaults() {
        let data = serde_json::json!({});
        let receipt = validate_extracted(&data, today());
        assert_eq!(receipt.confidence, 0.5);
    }

    #[test]
    fn transactions_bad_entries_skipped() {
        let response = r#"[
            {"date": "2024-01-15", "merchant": "Coffee Shop", "amount": 4.5},
            {"date": "nope", "merchant": "Bad", "amount": 1.0},
            {"date": "2024-01-16", "amount": 2.0}
        ]"#;
        let transactions = parse_transactions_response(response).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].merchant, "Coffee Shop");
    }

    #[test]
    fn category_response_outside_set_is_other() {
        let categories = vec!["Meals Dining".to_string(), "Utilities".to_string()];
        assert_eq!(
            parse_category_response("Meals Dining", &categories),
            "Meals Dining"
        );
        assert_eq!(parse_category_response("Groceries", &categories), "Other");
    }

    #[test]
    fn insights_split_and_capped() {
        let response = "- Spending is up\n1. Coffee dominates\n\n* Watch subscriptions\nFour\nFive\nSix";
        let insights = parse_insights_response(response);
        assert_eq!(insights.len(), 5);
        assert_eq!(insights[0], "Spending is up");
        assert_eq!(insights[1], "Coffee dominates");
    }
}
