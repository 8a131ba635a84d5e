//! Receipt review workflow handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_PAGE_SIZE};
use outlay_core::ai::UNKNOWN_MERCHANT;
use outlay_core::db::ReviewStats;
use outlay_core::models::{Category, Expense, NewExpense, Receipt, ReviewStatus};

/// Pagination parameters for the review queue
#[derive(Debug, Deserialize)]
pub struct ReviewPageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// A receipt with its backing expense, when one exists
#[derive(Debug, Serialize)]
pub struct ReceiptWithExpense {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub expense: Option<Expense>,
}

/// Paginated review queue
#[derive(Debug, Serialize)]
pub struct PendingReviewsResponse {
    pub receipts: Vec<ReceiptWithExpense>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

/// GET /api/receipt-review/pending - Receipts awaiting review
pub async fn pending_reviews(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReviewPageQuery>,
) -> Result<Json<PendingReviewsResponse>, AppError> {
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * per_page;

    let receipts = state
        .db
        .list_receipts_by_review_status(ReviewStatus::Pending, per_page, offset)?;
    let total = state
        .db
        .count_receipts_by_review_status(ReviewStatus::Pending)?;

    let mut annotated = Vec::with_capacity(receipts.len());
    for receipt in receipts {
        let expense = state.db.get_expense_for_receipt(receipt.id)?;
        annotated.push(ReceiptWithExpense { receipt, expense });
    }

    Ok(Json(PendingReviewsResponse {
        receipts: annotated,
        total,
        pages: (total + per_page - 1) / per_page,
        current_page: page,
    }))
}

/// Receipt detail for the review screen
#[derive(Debug, Serialize)]
pub struct ReviewDetailsResponse {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub expense: Option<Expense>,
    pub available_categories: Vec<Category>,
}

/// GET /api/receipt-review/:id - Receipt details for review
pub async fn review_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewDetailsResponse>, AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;
    let expense = state.db.get_expense_for_receipt(id)?;

    Ok(Json(ReviewDetailsResponse {
        receipt,
        expense,
        available_categories: state.db.list_categories()?,
    }))
}

/// Request body carrying the reviewed overlay
#[derive(Debug, Default, Deserialize)]
pub struct ReviewDataRequest {
    pub reviewed_data: Option<serde_json::Value>,
}

/// Response for approve/reject operations
#[derive(Debug, Serialize)]
pub struct ReviewActionResponse {
    pub message: String,
    pub receipt: Receipt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<Expense>,
}

/// POST /api/receipt-review/:id/approve - Approve with reviewed data
pub async fn approve_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<ReviewDataRequest>>,
) -> Result<Json<ReviewActionResponse>, AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    // The reviewed overlay wins; fall back to the extracted data
    let reviewed = body
        .and_then(|Json(b)| b.reviewed_data)
        .or_else(|| receipt.extracted_data.clone())
        .unwrap_or_else(|| serde_json::json!({}));

    let merchant = reviewed
        .get("merchant")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_MERCHANT)
        .to_string();
    let amount = reviewed
        .get("amount")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let date = reviewed
        .get("date")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());
    let category_id = match reviewed.get("category").and_then(|v| v.as_str()) {
        Some(name) => state.db.get_category_by_name(name)?.map(|c| c.id),
        None => None,
    };
    let description = reviewed
        .get("description")
        .and_then(|v| v.as_str())
        .map(String::from);

    let expense_fields = NewExpense {
        merchant,
        amount,
        date,
        description,
        category_id,
        ..Default::default()
    };

    let expense_id = state
        .db
        .approve_receipt(id, &reviewed.to_string(), &expense_fields)?;

    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::internal("Receipt not found after approval"))?;
    let expense = state.db.get_expense(expense_id)?;

    Ok(Json(ReviewActionResponse {
        message: "Receipt approved successfully".to_string(),
        receipt,
        expense,
    }))
}

/// POST /api/receipt-review/:id/reject - Reject a receipt
pub async fn reject_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewActionResponse>, AppError> {
    if state.db.get_receipt(id)?.is_none() {
        return Err(AppError::not_found("Receipt not found"));
    }

    state.db.reject_receipt(id)?;

    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::internal("Receipt not found after rejection"))?;

    Ok(Json(ReviewActionResponse {
        message: "Receipt rejected".to_string(),
        receipt,
        expense: None,
    }))
}

/// PUT /api/receipt-review/:id/update - Store the reviewed overlay
pub async fn update_review_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewDataRequest>,
) -> Result<Json<ReviewActionResponse>, AppError> {
    if state.db.get_receipt(id)?.is_none() {
        return Err(AppError::not_found("Receipt not found"));
    }

    let reviewed = body.reviewed_data.unwrap_or_else(|| serde_json::json!({}));
    state.db.update_receipt_reviewed(id, &reviewed.to_string())?;

    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::internal("Receipt not found after update"))?;

    Ok(Json(ReviewActionResponse {
        message: "Receipt data updated".to_string(),
        receipt,
        expense: None,
    }))
}

/// GET /api/receipt-review/stats - Review queue statistics
pub async fn review_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReviewStats>, AppError> {
    Ok(Json(state.db.review_stats()?))
}
