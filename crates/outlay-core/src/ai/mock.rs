//! Mock backend for testing
//!
//! Returns deterministic responses for all AI operations, so tests and
//! offline development never need a live model endpoint.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::models::ReceiptFileType;
use crate::statement::StatementTransaction;

use super::types::ExtractedReceipt;
use super::AiBackend;

/// Mock AI backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn extract_receipt(
        &self,
        _image_data: &[u8],
        _file_type: ReceiptFileType,
    ) -> Result<ExtractedReceipt> {
        Ok(ExtractedReceipt {
            merchant: "Mock Cafe".to_string(),
            amount: 42.50,
            date: Utc::now().date_naive(),
            items: vec!["Espresso".to_string(), "Croissant".to_string()],
            category: "Meals Dining".to_string(),
            tax: Some(3.15),
            tip: None,
            payment_method: Some("Credit Card".to_string()),
            address: None,
            phone: None,
            confidence: 0.9,
            error: None,
        })
    }

    async fn extract_transactions(&self, _text: &str) -> Result<Vec<StatementTransaction>> {
        Ok(vec![StatementTransaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            merchant: "Mock Merchant".to_string(),
            amount: 19.99,
            description: "Mock statement line".to_string(),
        }])
    }

    async fn categorize_transaction(
        &self,
        merchant: &str,
        _description: &str,
        categories: &[String],
    ) -> Result<String> {
        let guess = match merchant.to_uppercase() {
            m if m.contains("COFFEE") || m.contains("CAFE") || m.contains("RESTAURANT") => {
                "Meals Dining"
            }
            m if m.contains("UBER") || m.contains("LYFT") || m.contains("AIRLINE") => {
                "Transportation"
            }
            m if m.contains("HOTEL") => "Accommodation",
            _ => "Other",
        };

        if categories.iter().any(|c| c == guess) {
            Ok(guess.to_string())
        } else {
            Ok("Other".to_string())
        }
    }

    async fn answer_question(&self, question: &str, _context: &str) -> Result<String> {
        Ok(format!(
            "Based on your expense data, here is what I can tell you about \"{}\".",
            question
        ))
    }

    async fn spending_insights(&self, _context: &str) -> Result<Vec<String>> {
        Ok(vec![
            "Your dining spend is the largest category this month.".to_string(),
            "Three merchants account for most of your total spend.".to_string(),
            "This month is tracking below your overall monthly average.".to_string(),
        ])
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
