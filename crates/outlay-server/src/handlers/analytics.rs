//! Analytics handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use outlay_core::db::{AnalyticsSummary, CategoryBreakdown, MerchantSpend, MonthlySpend};

/// GET /api/analytics/summary - Dashboard summary
pub async fn analytics_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(state.db.analytics_summary()?))
}

/// GET /api/analytics/monthly-spending - Totals per calendar month
pub async fn monthly_spending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MonthlySpend>>, AppError> {
    Ok(Json(state.db.monthly_spending()?))
}

/// GET /api/analytics/category-breakdown - Totals per category with colors
pub async fn category_breakdown(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryBreakdown>>, AppError> {
    Ok(Json(state.db.category_breakdown()?))
}

/// GET /api/analytics/merchant-spending - Top merchants by spend
pub async fn merchant_spending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MerchantSpend>>, AppError> {
    Ok(Json(state.db.merchant_spending(10)?))
}
