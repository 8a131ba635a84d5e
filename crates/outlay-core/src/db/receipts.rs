//! Receipt workflow operations

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Expense, NewExpense, NewReceipt, Receipt, ReviewStatus};

/// Receipt review statistics
#[derive(Debug, Clone, Serialize)]
pub struct ReviewStats {
    pub total_receipts: i64,
    pub pending_receipts: i64,
    pub approved_receipts: i64,
    pub rejected_receipts: i64,
    pub approval_rate: f64,
}

const RECEIPT_COLUMNS: &str = "id, filename, file_path, file_type, extracted_json, \
     is_processed, review_status, reviewed_json, created_at";

impl Database {
    /// Create a receipt
    pub fn create_receipt(&self, receipt: &NewReceipt) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO receipts (filename, file_path, file_type, content_hash)
             VALUES (?, ?, ?, ?)",
            params![
                receipt.filename,
                receipt.file_path,
                receipt.file_type.as_str(),
                receipt.content_hash,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a receipt by ID
    pub fn get_receipt(&self, id: i64) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM receipts WHERE id = ?", RECEIPT_COLUMNS);
        let receipt = conn
            .query_row(&sql, params![id], |row| Self::row_to_receipt(row))
            .optional()?;

        Ok(receipt)
    }

    /// Get a receipt by content hash (duplicate-upload detection)
    pub fn get_receipt_by_hash(&self, content_hash: &str) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM receipts WHERE content_hash = ?",
            RECEIPT_COLUMNS
        );
        let receipt = conn
            .query_row(&sql, params![content_hash], |row| Self::row_to_receipt(row))
            .optional()?;

        Ok(receipt)
    }

    /// List all receipts, newest first
    pub fn list_receipts(&self) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM receipts ORDER BY created_at DESC, id DESC",
            RECEIPT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let receipts = stmt
            .query_map([], |row| Self::row_to_receipt(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    /// List receipts in a review state, newest first, paginated
    pub fn list_receipts_by_review_status(
        &self,
        status: ReviewStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM receipts WHERE review_status = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            RECEIPT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let receipts = stmt
            .query_map(params![status.as_str(), limit, offset], |row| {
                Self::row_to_receipt(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    /// Count receipts in a review state
    pub fn count_receipts_by_review_status(&self, status: ReviewStatus) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM receipts WHERE review_status = ?",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a receipt row. The caller removes the backing file.
    pub fn delete_receipt(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM receipts WHERE id = ?", params![id])?;
        Ok(changed > 0)
    }

    /// Store model-extracted data and mark the receipt processed
    pub fn update_receipt_extracted(&self, id: i64, extracted_json: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE receipts SET extracted_json = ?, is_processed = 1 WHERE id = ?",
            params![extracted_json, id],
        )?;
        Ok(())
    }

    /// Merge a JSON object patch into the stored extracted data
    /// (manual correction of individual fields)
    pub fn merge_receipt_extracted(
        &self,
        id: i64,
        patch: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let conn = self.conn()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT extracted_json FROM receipts WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let mut merged = existing
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .unwrap_or_else(|| serde_json::json!({}));

        if let (Some(target), Some(source)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }

        conn.execute(
            "UPDATE receipts SET extracted_json = ? WHERE id = ?",
            params![merged.to_string(), id],
        )?;

        Ok(merged)
    }

    /// Store the human-reviewed overlay without changing review status
    pub fn update_receipt_reviewed(&self, id: i64, reviewed_json: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE receipts SET reviewed_json = ? WHERE id = ?",
            params![reviewed_json, id],
        )?;
        Ok(())
    }

    /// Get the expense backed by a receipt, if any
    pub fn get_expense_for_receipt(&self, receipt_id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                "SELECT e.id, e.merchant, e.amount, e.date, e.description,
                        e.category_id, e.receipt_id, e.reimbursement_status, e.verification_status,
                        e.created_at, e.updated_at, c.id, c.name, c.color, c.created_at
                 FROM expenses e LEFT JOIN categories c ON c.id = e.category_id
                 WHERE e.receipt_id = ?",
                params![receipt_id],
                |row| Self::row_to_expense(row),
            )
            .optional()?;

        Ok(expense)
    }

    /// Create an expense from a receipt's extracted data, linking the two.
    /// Runs as a single transaction.
    pub fn create_expense_from_receipt(
        &self,
        receipt_id: i64,
        expense: &NewExpense,
    ) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
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
                receipt_id,
                expense.reimbursement_status.as_str(),
                expense.verification_status.as_str(),
            ],
        )?;
        let expense_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(expense_id)
    }

    /// Approve a receipt: store the reviewed overlay, flip review status,
    /// and create or update the backing expense as verified.
    /// Runs as a single transaction; returns the expense ID.
    pub fn approve_receipt(
        &self,
        receipt_id: i64,
        reviewed_json: &str,
        expense: &NewExpense,
    ) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE receipts SET review_status = 'approved', reviewed_json = ? WHERE id = ?",
            params![reviewed_json, receipt_id],
        )?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM expenses WHERE receipt_id = ?",
                params![receipt_id],
                |row| row.get(0),
            )
            .optional()?;

        let expense_id = match existing {
            Some(id) => {
                tx.execute(
                    r#"
                    UPDATE expenses SET merchant = ?, amount = ?, date = ?, description = ?,
                        category_id = ?, verification_status = 'verified',
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                    params![
                        expense.merchant,
                        expense.amount,
                        expense.date.to_string(),
                        expense.description,
                        expense.category_id,
                        id,
                    ],
                )?;
                id
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO expenses (merchant, amount, date, description, category_id,
                        receipt_id, verification_status)
                    VALUES (?, ?, ?, ?, ?, ?, 'verified')
                    "#,
                    params![
                        expense.merchant,
                        expense.amount,
                        expense.date.to_string(),
                        expense.description,
                        expense.category_id,
                        receipt_id,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.commit()?;
        Ok(expense_id)
    }

    /// Reject a receipt; a backing expense is marked rejected as well.
    /// Runs as a single transaction.
    pub fn reject_receipt(&self, receipt_id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE receipts SET review_status = 'rejected' WHERE id = ?",
            params![receipt_id],
        )?;
        tx.execute(
            "UPDATE expenses SET verification_status = 'rejected', updated_at = CURRENT_TIMESTAMP
             WHERE receipt_id = ?",
            params![receipt_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Review-queue statistics
    pub fn review_stats(&self) -> Result<ReviewStats> {
        let conn = self.conn()?;
        let (total, pending, approved, rejected): (i64, i64, i64, i64) = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(review_status = 'pending'), 0),
                   COALESCE(SUM(review_status = 'approved'), 0),
                   COALESCE(SUM(review_status = 'rejected'), 0)
            FROM receipts
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(ReviewStats {
            total_receipts: total,
            pending_receipts: pending,
            approved_receipts: approved,
            rejected_receipts: rejected,
            approval_rate: if total > 0 {
                approved as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
    }

    fn row_to_receipt(row: &rusqlite::Row) -> rusqlite::Result<Receipt> {
        let file_type_str: String = row.get(3)?;
        let extracted_str: Option<String> = row.get(4)?;
        let review_status_str: String = row.get(6)?;
        let reviewed_str: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(8)?;

        Ok(Receipt {
            id: row.get(0)?,
            filename: row.get(1)?,
            file_path: row.get(2)?,
            file_type: file_type_str.parse().unwrap_or(crate::models::ReceiptFileType::Jpg),
            extracted_data: extracted_str.and_then(|s| serde_json::from_str(&s).ok()),
            is_processed: row.get(5)?,
            review_status: review_status_str.parse().unwrap_or_default(),
            reviewed_data: reviewed_str.and_then(|s| serde_json::from_str(&s).ok()),
            created_at: parse_datetime(&created_at_str),
        })
    }
}
