//! Aggregate queries for analytics endpoints and the assistant snapshot

use chrono::{Datelike, Utc};
use serde::Serialize;

use super::Database;
use crate::error::Result;
use crate::models::Expense;

/// Top-line analytics for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_expenses: f64,
    pub this_month_expenses: f64,
    pub total_receipts: i64,
    pub avg_per_receipt: f64,
    pub recent_expenses: Vec<Expense>,
    pub top_categories: Vec<CategorySpend>,
}

/// Spend total for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub name: String,
    pub amount: f64,
}

/// Spend total for one calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySpend {
    pub month: String,
    pub total: f64,
}

/// Category spend with display color
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub name: String,
    pub color: String,
    pub amount: f64,
}

/// Spend total for one merchant
#[derive(Debug, Clone, Serialize)]
pub struct MerchantSpend {
    pub merchant: String,
    pub amount: f64,
}

impl Database {
    /// Sum of all expense amounts
    pub fn total_expense_amount(&self) -> Result<f64> {
        let conn = self.conn()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Sum of expense amounts in the current calendar month
    pub fn this_month_expense_amount(&self) -> Result<f64> {
        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let conn = self.conn()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE date >= ?",
            rusqlite::params![month_start.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Number of expense rows
    pub fn count_expenses(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of receipt rows
    pub fn count_receipts(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM receipts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Most recent expenses by date
    pub fn recent_expenses(&self, limit: i64) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.merchant, e.amount, e.date, e.description,
                    e.category_id, e.receipt_id, e.reimbursement_status, e.verification_status,
                    e.created_at, e.updated_at, c.id, c.name, c.color, c.created_at
             FROM expenses e LEFT JOIN categories c ON c.id = e.category_id
             ORDER BY e.date DESC, e.id DESC LIMIT ?",
        )?;

        let expenses = stmt
            .query_map(rusqlite::params![limit], |row| Self::row_to_expense(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Per-category expense totals, largest first
    pub fn category_totals(&self, limit: Option<i64>) -> Result<Vec<CategorySpend>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT c.name, COALESCE(SUM(e.amount), 0) AS total
             FROM expenses e JOIN categories c ON c.id = e.category_id
             GROUP BY c.id, c.name ORDER BY total DESC{}",
            match limit {
                Some(n) => format!(" LIMIT {}", n),
                None => String::new(),
            }
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CategorySpend {
                    name: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Top-line analytics for the dashboard
    pub fn analytics_summary(&self) -> Result<AnalyticsSummary> {
        let total_expenses = self.total_expense_amount()?;
        let this_month_expenses = self.this_month_expense_amount()?;
        let total_receipts = self.count_receipts()?;
        let recent_expenses = self.recent_expenses(5)?;
        let top_categories = self.category_totals(Some(3))?;

        Ok(AnalyticsSummary {
            total_expenses,
            this_month_expenses,
            total_receipts,
            avg_per_receipt: if total_receipts > 0 {
                total_expenses / total_receipts as f64
            } else {
                0.0
            },
            recent_expenses,
            top_categories,
        })
    }

    /// Expense totals per calendar month, oldest first
    pub fn monthly_spending(&self) -> Result<Vec<MonthlySpend>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT strftime('%Y-%m', date) AS month, COALESCE(SUM(amount), 0)
             FROM expenses GROUP BY month ORDER BY month",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MonthlySpend {
                    month: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Expense totals per category with display colors
    pub fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.name, c.color, COALESCE(SUM(e.amount), 0) AS total
             FROM expenses e JOIN categories c ON c.id = e.category_id
             GROUP BY c.id, c.name, c.color ORDER BY total DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryBreakdown {
                    name: row.get(0)?,
                    color: row.get(1)?,
                    amount: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Top merchants by total expense spend
    pub fn merchant_spending(&self, limit: i64) -> Result<Vec<MerchantSpend>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT merchant, COALESCE(SUM(amount), 0) AS total
             FROM expenses GROUP BY merchant ORDER BY total DESC LIMIT ?",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok(MerchantSpend {
                    merchant: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
