//! Credit-card statement and transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::receipts::read_upload;
use crate::{AppError, AppState, MAX_PAGE_SIZE};
use outlay_core::ai::AiBackend;
use outlay_core::db::{MatchSummary, TransactionAnalytics};
use outlay_core::models::{CreditCardTransaction, NewCreditCardTransaction, TransactionStatus};
use outlay_core::statement::{parse_csv_statement, ParsedStatement};

/// Response for statement upload
#[derive(Debug, Serialize)]
pub struct StatementUploadResponse {
    pub message: String,
    pub transactions_imported: usize,
    /// Statement rows dropped during normalization
    pub rows_skipped: usize,
    pub auto_match_results: MatchSummary,
    pub filename: String,
}

/// POST /api/credit-card/upload-statement - Upload and process a statement
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StatementUploadResponse>, AppError> {
    let (filename, bytes) = read_upload(&mut multipart).await?;

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !matches!(extension.as_str(), "csv" | "txt" | "pdf") {
        return Err(AppError::bad_request(
            "Unsupported file type. Please upload CSV, TXT, or PDF files.",
        ));
    }

    let content = String::from_utf8(bytes)
        .map_err(|_| AppError::bad_request("Statement file must be UTF-8 text"))?;

    // CSV goes through the structured parser; everything else is handed
    // to the model for free-text extraction.
    let parsed = if extension == "csv" {
        parse_csv_statement(content.as_bytes())?
    } else {
        let ai = state.ai.as_ref().ok_or_else(|| {
            AppError::bad_request(
                "AI backend not configured. Only CSV statements can be parsed without it.",
            )
        })?;
        ParsedStatement {
            transactions: ai.extract_transactions(&content).await.map_err(|e| {
                AppError::internal(&format!("Failed to extract transactions: {}", e))
            })?,
            skipped: 0,
        }
    };

    if parsed.transactions.is_empty() {
        return Err(AppError::bad_request(
            "No transactions found in the statement",
        ));
    }

    let categories = state.db.list_categories()?;
    let category_names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();

    let mut records = Vec::with_capacity(parsed.transactions.len());
    for tx in &parsed.transactions {
        // Categorization is best-effort; a model failure leaves the
        // transaction uncategorized rather than failing the upload
        let category_id = match &state.ai {
            Some(ai) => match ai
                .categorize_transaction(&tx.merchant, &tx.description, &category_names)
                .await
            {
                Ok(name) => categories.iter().find(|c| c.name == name).map(|c| c.id),
                Err(e) => {
                    warn!(error = %e, merchant = %tx.merchant, "Categorization failed");
                    None
                }
            },
            None => None,
        };

        records.push(NewCreditCardTransaction {
            date: tx.date,
            merchant: tx.merchant.clone(),
            amount: tx.amount,
            category_id,
            description: Some(tx.description.clone()),
            statement_file: Some(filename.clone()),
        });
    }

    let inserted = state.db.save_statement_transactions(&records)?;
    let auto_match_results = state.db.run_auto_match(&state.config.match_config)?;

    Ok(Json(StatementUploadResponse {
        message: "Statement processed successfully".to_string(),
        transactions_imported: inserted.len(),
        rows_skipped: parsed.skipped,
        auto_match_results,
        filename,
    }))
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    /// Filter by status (unmatched, matched)
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// Paginated transaction listing
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<CreditCardTransaction>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

/// GET /api/credit-card/transactions - List transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let status: Option<TransactionStatus> = params
        .status
        .as_deref()
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::bad_request("Invalid status. Use: unmatched, matched"))
        })
        .transpose()?;

    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * per_page;

    let transactions = state.db.list_transactions(status, per_page, offset)?;
    let total = state.db.count_transactions(status)?;

    Ok(Json(TransactionListResponse {
        transactions,
        total,
        pages: (total + per_page - 1) / per_page,
        current_page: page,
    }))
}

/// Response for creating an expense from a transaction
#[derive(Debug, Serialize)]
pub struct TransactionExpenseResponse {
    pub message: String,
    pub expense_id: i64,
    pub transaction_id: i64,
}

/// POST /api/credit-card/transactions/:id/create-expense
pub async fn create_expense_from_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionExpenseResponse>, AppError> {
    let expense_id = state.db.create_expense_from_transaction(id)?;

    Ok(Json(TransactionExpenseResponse {
        message: "Expense created successfully".to_string(),
        expense_id,
        transaction_id: id,
    }))
}

/// Response for a manually triggered match pass
#[derive(Debug, Serialize)]
pub struct AutoMatchResponse {
    pub message: String,
    pub results: MatchSummary,
}

/// POST /api/credit-card/run-auto-match - Trigger the match pass
pub async fn run_auto_match(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AutoMatchResponse>, AppError> {
    let results = state.db.run_auto_match(&state.config.match_config)?;

    Ok(Json(AutoMatchResponse {
        message: "Auto-matching completed".to_string(),
        results,
    }))
}

/// GET /api/credit-card/analytics - Transaction analytics
pub async fn credit_card_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TransactionAnalytics>, AppError> {
    Ok(Json(state.db.transaction_analytics()?))
}
