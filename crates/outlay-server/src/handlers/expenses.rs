//! Expense and category handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, MessageResponse};
use outlay_core::db::ExpenseFilter;
use outlay_core::models::{Category, Expense, NewExpense};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    pub category_id: Option<i64>,
    /// Substring match on merchant name
    pub merchant: Option<String>,
    /// Inclusive start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end_date: Option<String>,
}

fn parse_iso_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(&format!("Invalid {} (use YYYY-MM-DD)", field)))
}

/// GET /api/expenses - List expenses with optional filters
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let filter = ExpenseFilter {
        category_id: params.category_id,
        merchant: params.merchant,
        start_date: params
            .start_date
            .as_deref()
            .map(|d| parse_iso_date(d, "start_date"))
            .transpose()?,
        end_date: params
            .end_date
            .as_deref()
            .map(|d| parse_iso_date(d, "end_date"))
            .transpose()?,
    };

    Ok(Json(state.db.list_expenses(&filter)?))
}

/// Request body for creating or updating an expense
#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub merchant: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub reimbursement_status: Option<String>,
    pub verification_status: Option<String>,
}

/// POST /api/expenses - Create an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let merchant = body
        .merchant
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("merchant is required"))?;
    let amount = body
        .amount
        .ok_or_else(|| AppError::bad_request("amount is required"))?;
    let date = body
        .date
        .ok_or_else(|| AppError::bad_request("date is required"))?;

    // Unknown status strings are rejected, never stored
    let reimbursement_status = body
        .reimbursement_status
        .as_deref()
        .map(|s| s.parse().map_err(|e: String| AppError::bad_request(&e)))
        .transpose()?
        .unwrap_or_default();
    let verification_status = body
        .verification_status
        .as_deref()
        .map(|s| s.parse().map_err(|e: String| AppError::bad_request(&e)))
        .transpose()?
        .unwrap_or_default();

    let expense = NewExpense {
        merchant,
        amount,
        date: parse_iso_date(&date, "date")?,
        description: body.description,
        category_id: body.category_id,
        receipt_id: None,
        reimbursement_status,
        verification_status,
    };

    let id = state.db.create_expense(&expense)?;
    let created = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::internal("Expense not found after creation"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/expenses/:id - Get a specific expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(expense))
}

/// PUT /api/expenses/:id - Update an expense (absent fields keep their values)
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let existing = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    let reimbursement_status = match body.reimbursement_status.as_deref() {
        Some(s) => s.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => existing.reimbursement_status,
    };
    let verification_status = match body.verification_status.as_deref() {
        Some(s) => s.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => existing.verification_status,
    };

    let updated = NewExpense {
        merchant: body.merchant.unwrap_or(existing.merchant),
        amount: body.amount.unwrap_or(existing.amount),
        date: match body.date.as_deref() {
            Some(d) => parse_iso_date(d, "date")?,
            None => existing.date,
        },
        description: body.description.or(existing.description),
        category_id: body.category_id.or(existing.category_id),
        receipt_id: existing.receipt_id,
        reimbursement_status,
        verification_status,
    };

    state.db.update_expense(id, &updated)?;
    let expense = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::internal("Expense not found after update"))?;

    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.db.delete_expense(id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    Ok(Json(MessageResponse::new("Expense deleted successfully")))
}

/// Request body for creating a category
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub color: Option<String>,
}

/// GET /api/categories - List categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.db.list_categories()?))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }

    let id = state
        .db
        .create_category(body.name.trim(), body.color.as_deref())?;
    let category = state
        .db
        .get_category(id)?
        .ok_or_else(|| AppError::internal("Category not found after creation"))?;

    Ok((StatusCode::CREATED, Json(category)))
}
