//! Outlay Web Server
//!
//! Axum-based REST API for the Outlay expense tracker.
//!
//! - CRUD for expenses, categories, receipts, and credit-card transactions
//! - Receipt upload with AI field extraction and a human review workflow
//! - Statement upload with CSV/free-text parsing and auto-matching
//! - Conversational assistant and analytics endpoints
//!
//! Every route permits cross-origin calls from any origin; error responses
//! carry an `error` message field with a 4xx/5xx status.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use outlay_core::ai::AiClient;
use outlay_core::db::Database;
use outlay_core::matcher::MatchConfig;

mod handlers;

#[cfg(test)]
mod tests;

/// Maximum file upload size (16 MB)
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum pagination page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Directory for uploaded receipt and statement files
    pub uploads_dir: std::path::PathBuf,
    /// Matching thresholds for the auto-match pass
    pub match_config: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            uploads_dir: std::path::PathBuf::from("uploads"),
            match_config: MatchConfig::from_env(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    /// AI backend; None when not configured. AI-dependent endpoints
    /// report that with a 400 rather than failing at startup.
    pub ai: Option<AiClient>,
    pub config: ServerConfig,
}

/// Success response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AiClient::from_env();
    match ai {
        Some(_) => info!("AI backend configured"),
        None => info!("AI backend not configured (set OPENAI_API_KEY to enable AI features)"),
    }

    create_router_with_ai(db, static_dir, config, ai)
}

/// Create the application router with an explicit AI client (for testing)
pub fn create_router_with_ai(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    ai: Option<AiClient>,
) -> Router {
    let state = Arc::new(AppState { db, ai, config });

    let api_routes = Router::new()
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        // Receipts
        .route("/receipts/upload", post(handlers::upload_receipt))
        .route("/receipts", get(handlers::list_receipts))
        .route(
            "/receipts/:id",
            get(handlers::get_receipt).delete(handlers::delete_receipt),
        )
        .route(
            "/receipts/:id/create-expense",
            post(handlers::create_expense_from_receipt),
        )
        .route("/receipts/:id/reprocess", post(handlers::reprocess_receipt))
        .route("/receipts/:id/update-data", put(handlers::update_receipt_data))
        // Receipt review
        .route("/receipt-review/pending", get(handlers::pending_reviews))
        .route("/receipt-review/stats", get(handlers::review_stats))
        .route("/receipt-review/:id", get(handlers::review_details))
        .route("/receipt-review/:id/approve", post(handlers::approve_receipt))
        .route("/receipt-review/:id/reject", post(handlers::reject_receipt))
        .route("/receipt-review/:id/update", put(handlers::update_review_data))
        // Credit card
        .route(
            "/credit-card/upload-statement",
            post(handlers::upload_statement),
        )
        .route("/credit-card/transactions", get(handlers::list_transactions))
        .route(
            "/credit-card/transactions/:id/create-expense",
            post(handlers::create_expense_from_transaction),
        )
        .route("/credit-card/run-auto-match", post(handlers::run_auto_match))
        .route("/credit-card/analytics", get(handlers::credit_card_analytics))
        // AI assistant
        .route("/ai-assistant/chat", post(handlers::chat))
        .route("/ai-assistant/insights", get(handlers::insights))
        .route("/ai-assistant/suggestions", get(handlers::suggestions))
        // Analytics
        .route("/analytics/summary", get(handlers::analytics_summary))
        .route("/analytics/monthly-spending", get(handlers::monthly_spending))
        .route(
            "/analytics/category-breakdown",
            get(handlers::category_breakdown),
        )
        .route(
            "/analytics/merchant-spending",
            get(handlers::merchant_spending),
        );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        // Every route is callable cross-origin from any origin
        .layer(CorsLayer::permissive());

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<outlay_core::Error> for AppError {
    fn from(err: outlay_core::Error) -> Self {
        use outlay_core::Error;

        match err {
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::InvalidData(msg) | Error::Statement(msg) => Self::bad_request(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
