//! Conversational assistant handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use outlay_core::assistant;
use outlay_core::SUGGESTED_QUESTIONS;

/// Request body for a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Chat answer with server timestamp
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
}

/// POST /api/ai-assistant/chat - Ask a question about the expense data
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("Message is required"))?;

    let ai = state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::bad_request("AI backend not configured"))?;

    let response = assistant::chat(ai, &state.db, message)
        .await
        .map_err(|e| AppError::internal(&format!("Assistant error: {}", e)))?;

    Ok(Json(ChatResponse {
        response,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Generated insights with server timestamp
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
    pub generated_at: String,
}

/// GET /api/ai-assistant/insights - Automatic spending insights
pub async fn insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightsResponse>, AppError> {
    let ai = state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::bad_request("AI backend not configured"))?;

    let insights = assistant::insights(ai, &state.db)
        .await
        .map_err(|e| AppError::internal(&format!("Assistant error: {}", e)))?;

    Ok(Json(InsightsResponse {
        insights,
        generated_at: Utc::now().to_rfc3339(),
    }))
}

/// Fixed starter questions
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<&'static str>,
}

/// GET /api/ai-assistant/suggestions - Starter questions for the chat UI
pub async fn suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: SUGGESTED_QUESTIONS.to_vec(),
    })
}
