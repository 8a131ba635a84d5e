//! Expense CRUD and filtered listing

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, Expense, NewExpense};

/// Optional filters for listing expenses
#[derive(Debug, Default, Clone)]
pub struct ExpenseFilter {
    pub category_id: Option<i64>,
    /// Case-insensitive substring match on the merchant name
    pub merchant: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

const EXPENSE_COLUMNS: &str = "e.id, e.merchant, e.amount, e.date, e.description, \
     e.category_id, e.receipt_id, e.reimbursement_status, e.verification_status, \
     e.created_at, e.updated_at, c.id, c.name, c.color, c.created_at";

impl Database {
    /// Create an expense
    pub fn create_expense(&self, expense: &NewExpense) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (merchant, amount, date, description, category_id,
                receipt_id, reimbursement_status, verification_status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                expense.merchant,
                expense.amount,
                expense.date.to_string(),
                expense.description,
                expense.category_id,
                expense.receipt_id,
                expense.reimbursement_status.as_str(),
                expense.verification_status.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get an expense by ID
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM expenses e LEFT JOIN categories c ON c.id = e.category_id WHERE e.id = ?",
            EXPENSE_COLUMNS
        );
        let expense = conn
            .query_row(&sql, params![id], |row| Self::row_to_expense(row))
            .optional()?;

        Ok(expense)
    }

    /// List expenses, newest first, with optional filters
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(category_id) = filter.category_id {
            conditions.push("e.category_id = ?");
            values.push(Box::new(category_id));
        }
        if let Some(ref merchant) = filter.merchant {
            conditions.push("e.merchant LIKE ? COLLATE NOCASE");
            values.push(Box::new(format!("%{}%", merchant.trim())));
        }
        if let Some(start) = filter.start_date {
            conditions.push("e.date >= ?");
            values.push(Box::new(start.to_string()));
        }
        if let Some(end) = filter.end_date {
            conditions.push("e.date <= ?");
            values.push(Box::new(end.to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM expenses e LEFT JOIN categories c ON c.id = e.category_id \
             {} ORDER BY e.date DESC, e.id DESC",
            EXPENSE_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let expenses = stmt
            .query_map(value_refs.as_slice(), |row| Self::row_to_expense(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Overwrite the mutable columns of an expense and refresh `updated_at`.
    /// The caller merges partial updates onto the existing row first.
    pub fn update_expense(&self, id: i64, expense: &NewExpense) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE expenses SET merchant = ?, amount = ?, date = ?, description = ?,
                category_id = ?, receipt_id = ?, reimbursement_status = ?,
                verification_status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                expense.merchant,
                expense.amount,
                expense.date.to_string(),
                expense.description,
                expense.category_id,
                expense.receipt_id,
                expense.reimbursement_status.as_str(),
                expense.verification_status.as_str(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete an expense
    pub fn delete_expense(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(changed > 0)
    }

    pub(crate) fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(3)?;
        let reimbursement_str: String = row.get(7)?;
        let verification_str: String = row.get(8)?;
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        // Category columns come from a LEFT JOIN; id is NULL when unlinked
        let category = match row.get::<_, Option<i64>>(11)? {
            Some(category_id) => {
                let cat_created: String = row.get(14)?;
                Some(Category {
                    id: category_id,
                    name: row.get(12)?,
                    color: row.get(13)?,
                    created_at: parse_datetime(&cat_created),
                })
            }
            None => None,
        };

        Ok(Expense {
            id: row.get(0)?,
            merchant: row.get(1)?,
            amount: row.get(2)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            description: row.get(4)?,
            category_id: row.get(5)?,
            category,
            receipt_id: row.get(6)?,
            reimbursement_status: reimbursement_str.parse().unwrap_or_default(),
            verification_status: verification_str.parse().unwrap_or_default(),
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
