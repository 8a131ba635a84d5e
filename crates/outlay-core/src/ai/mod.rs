//! Pluggable AI backend abstraction
//!
//! Receipt field extraction, free-text statement parsing, transaction
//! categorization, and the conversational assistant all delegate to an
//! external model API behind a single trait.
//!
//! # Architecture
//!
//! - `AiBackend` trait: the interface for all AI operations
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAiBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai, mock). Default: openai
//! - `OPENAI_API_KEY`: API key (required for the openai backend)
//! - `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_VISION_MODEL`: overrides

mod mock;
mod openai;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use types::{ExtractedReceipt, FALLBACK_CATEGORY, UNKNOWN_MERCHANT};

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::error::Result;
use crate::models::ReceiptFileType;
use crate::statement::StatementTransaction;

/// Trait defining the interface for all AI backends
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Extract and validate expense fields from a receipt image
    async fn extract_receipt(
        &self,
        image_data: &[u8],
        file_type: ReceiptFileType,
    ) -> Result<ExtractedReceipt>;

    /// Extract transactions from free-form statement text
    async fn extract_transactions(&self, text: &str) -> Result<Vec<StatementTransaction>>;

    /// Pick the best category for a transaction from the available names
    async fn categorize_transaction(
        &self,
        merchant: &str,
        description: &str,
        categories: &[String],
    ) -> Result<String>;

    /// Answer a user question given the expense-data context block
    async fn answer_question(&self, question: &str, context: &str) -> Result<String>;

    /// Generate 3-5 one-line insights over the expense-data context block
    async fn spending_insights(&self, context: &str) -> Result<Vec<String>>;

    /// Whether the backend is reachable
    async fn health_check(&self) -> bool;
}

/// Concrete AI client with compile-time dispatch
#[derive(Clone)]
pub enum AiClient {
    /// OpenAI-compatible backend (hosted API or self-hosted server)
    OpenAi(OpenAiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create an AI client from environment variables
    ///
    /// `AI_BACKEND` selects the backend (`openai` default, `mock` for
    /// offline use). Returns None when the selected backend is not
    /// configured.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai".to_string());

        match backend.to_lowercase().as_str() {
            "openai" => OpenAiBackend::from_env().map(AiClient::OpenAi),
            "mock" => Some(AiClient::Mock(MockBackend::new())),
            _ => {
                warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai");
                OpenAiBackend::from_env().map(AiClient::OpenAi)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl AiBackend for AiClient {
    async fn extract_receipt(
        &self,
        image_data: &[u8],
        file_type: ReceiptFileType,
    ) -> Result<ExtractedReceipt> {
        match self {
            AiClient::OpenAi(b) => b.extract_receipt(image_data, file_type).await,
            AiClient::Mock(b) => b.extract_receipt(image_data, file_type).await,
        }
    }

    async fn extract_transactions(&self, text: &str) -> Result<Vec<StatementTransaction>> {
        match self {
            AiClient::OpenAi(b) => b.extract_transactions(text).await,
            AiClient::Mock(b) => b.extract_transactions(text).await,
        }
    }

    async fn categorize_transaction(
        &self,
        merchant: &str,
        description: &str,
        categories: &[String],
    ) -> Result<String> {
        match self {
            AiClient::OpenAi(b) => {
                b.categorize_transaction(merchant, description, categories)
                    .await
            }
            AiClient::Mock(b) => {
                b.categorize_transaction(merchant, description, categories)
                    .await
            }
        }
    }

    async fn answer_question(&self, question: &str, context: &str) -> Result<String> {
        match self {
            AiClient::OpenAi(b) => b.answer_question(question, context).await,
            AiClient::Mock(b) => b.answer_question(question, context).await,
        }
    }

    async fn spending_insights(&self, context: &str) -> Result<Vec<String>> {
        match self {
            AiClient::OpenAi(b) => b.spending_insights(context).await,
            AiClient::Mock(b) => b.spending_insights(context).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::OpenAi(b) => b.health_check().await,
            AiClient::Mock(b) => b.health_check().await,
        }
    }
}

/// Run receipt extraction with the soft-fail contract.
///
/// Non-image files are refused without calling the model, and any backend
/// failure becomes a zero-confidence result with the `error` field set —
/// the caller treats both as "needs manual entry".
pub async fn extract_receipt_fields(
    ai: &AiClient,
    image_data: &[u8],
    file_type: ReceiptFileType,
) -> ExtractedReceipt {
    let today = Utc::now().date_naive();

    if !file_type.is_image() {
        return ExtractedReceipt::failure(
            format!("{} extraction is not supported", file_type),
            today,
        );
    }

    match ai.extract_receipt(image_data, file_type).await {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!(error = %e, "Receipt extraction failed");
            ExtractedReceipt::failure(e.to_string(), today)
        }
    }
}
