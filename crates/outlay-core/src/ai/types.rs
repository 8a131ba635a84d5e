//! AI backend response types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder merchant when the model returns none
pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// Category assigned when the model's suggestion is not in the closed set
pub const FALLBACK_CATEGORY: &str = "Other";

/// Validated field set extracted from a receipt.
///
/// Produced by clamping whatever JSON the model returns; `confidence` of
/// 0.0 together with a set `error` means extraction failed and the
/// receipt needs manual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    pub merchant: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub items: Vec<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractedReceipt {
    /// A zero-confidence result carrying the failure reason.
    /// Callers treat this as "needs manual entry", not a hard error.
    pub fn failure(reason: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            merchant: UNKNOWN_MERCHANT.to_string(),
            amount: 0.0,
            date: today,
            items: Vec::new(),
            category: FALLBACK_CATEGORY.to_string(),
            tax: None,
            tip: None,
            payment_method: None,
            address: None,
            phone: None,
            confidence: 0.0,
            error: Some(reason.into()),
        }
    }
}
