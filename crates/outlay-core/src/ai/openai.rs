//! OpenAI-compatible backend implementation
//!
//! Works with the hosted OpenAI API or any server that implements the
//! `/v1/chat/completions` endpoint (vLLM, LocalAI, llama-server, ...).
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_API_KEY`: API key (required for the hosted API)
//! - `OPENAI_BASE_URL`: Server URL (default: https://api.openai.com)
//! - `OPENAI_MODEL`: Text model name (default: gpt-4.1-mini)
//! - `OPENAI_VISION_MODEL`: Vision model for receipts (default: gpt-4o)

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::ReceiptFileType;
use crate::prompts;
use crate::statement::StatementTransaction;

use super::parsing::{
    parse_category_response, parse_insights_response, parse_receipt_response,
    parse_transactions_response,
};
use super::types::ExtractedReceipt;
use super::AiBackend;

/// Calls to the model API block the handling request, so they carry a
/// hard timeout; a timeout surfaces as a soft failure, not a crash.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    vision_model: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    /// Create a new backend
    pub fn new(base_url: &str, model: &str, vision_model: &str) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            vision_model: vision_model.to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, vision_model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model, vision_model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create from environment variables; None when no key is configured
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let vision_model =
            std::env::var("OPENAI_VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Some(Self::with_api_key(&base_url, &model, &vision_model, &api_key))
    }

    /// Host this backend talks to
    pub fn host(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<String> {
        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ai(format!("Model API error {}: {}", status, body)));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Ai("No response from model API".into()))
    }

    /// Make a text chat completion request
    async fn chat_completion(
        &self,
        system: Option<&str>,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: ChatContent::Text(system.to_string()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: ChatContent::Text(user.to_string()),
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };

        self.send(&request).await
    }

    /// Make a vision request (for receipt extraction)
    async fn vision_completion(
        &self,
        prompt: &str,
        image_data: &[u8],
        mime_type: &str,
    ) -> Result<String> {
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = ChatCompletionRequest {
            model: self.vision_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: ChatContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", mime_type, base64_image),
                        },
                    },
                ]),
            }],
            temperature: None,
            max_tokens: Some(1000),
        };

        self.send(&request).await
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Chat message content (text or multimodal)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Content part for multimodal messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// Image URL for vision requests
#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    async fn extract_receipt(
        &self,
        image_data: &[u8],
        file_type: ReceiptFileType,
    ) -> Result<ExtractedReceipt> {
        let response = self
            .vision_completion(
                &prompts::receipt_extraction(),
                image_data,
                file_type.mime_type(),
            )
            .await?;
        debug!("Receipt extraction response: {}", response);

        parse_receipt_response(&response, Utc::now().date_naive())
    }

    async fn extract_transactions(&self, text: &str) -> Result<Vec<StatementTransaction>> {
        let response = self
            .chat_completion(
                Some(&prompts::statement_extraction_system()),
                &prompts::statement_extraction_user(text),
                2000,
                0.1,
            )
            .await?;
        debug!("Statement extraction response: {}", response);

        parse_transactions_response(&response)
    }

    async fn categorize_transaction(
        &self,
        merchant: &str,
        description: &str,
        categories: &[String],
    ) -> Result<String> {
        let response = self
            .chat_completion(
                Some(&prompts::categorize_system(categories)),
                &prompts::categorize_user(merchant, description),
                50,
                0.1,
            )
            .await?;

        Ok(parse_category_response(&response, categories))
    }

    async fn answer_question(&self, question: &str, context: &str) -> Result<String> {
        self.chat_completion(Some(&prompts::chat_system(context)), question, 500, 0.7)
            .await
    }

    async fn spending_insights(&self, context: &str) -> Result<Vec<String>> {
        let response = self
            .chat_completion(None, &prompts::insights(context), 300, 0.7)
            .await?;

        Ok(parse_insights_response(&response))
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        match req_builder.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
