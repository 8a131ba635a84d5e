//! Credit-card transaction operations and the auto-match pass

use chrono::{Duration, NaiveDate};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::matcher::{merchants_similar, MatchConfig};
use crate::models::{CreditCardTransaction, NewCreditCardTransaction, TransactionStatus};

/// Result of an auto-match pass
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub total_transactions: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Count and total for one transaction status
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    pub status: TransactionStatus,
    pub count: i64,
    pub total_amount: f64,
}

/// Count and total for one calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub count: i64,
    pub total_amount: f64,
}

/// Count and total for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    pub count: i64,
    pub total_amount: f64,
}

/// Count and total for one merchant
#[derive(Debug, Clone, Serialize)]
pub struct MerchantTrend {
    pub merchant: String,
    pub count: i64,
    pub total_amount: f64,
}

/// Credit-card analytics bundle
#[derive(Debug, Clone, Serialize)]
pub struct TransactionAnalytics {
    pub status_breakdown: Vec<StatusBreakdown>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub category_breakdown: Vec<CategoryTrend>,
    pub top_merchants: Vec<MerchantTrend>,
}

const TRANSACTION_COLUMNS: &str = "t.id, t.date, t.merchant, t.amount, t.category_id, \
     c.name, t.description, t.status, t.matched_expense_id, t.statement_file, t.created_at";

impl Database {
    /// Create a credit-card transaction
    pub fn create_transaction(&self, tx: &NewCreditCardTransaction) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO credit_card_transactions (date, merchant, amount, category_id,
                description, statement_file)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.date.to_string(),
                tx.merchant,
                tx.amount,
                tx.category_id,
                tx.description,
                tx.statement_file,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Save a batch of statement transactions in one transaction, skipping
    /// rows whose (date, merchant, amount) already exist. Returns the IDs
    /// of inserted rows.
    pub fn save_statement_transactions(
        &self,
        transactions: &[NewCreditCardTransaction],
    ) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::new();

        for record in transactions {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM credit_card_transactions
                     WHERE date = ? AND merchant = ? AND amount = ?",
                    params![record.date.to_string(), record.merchant, record.amount],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO credit_card_transactions (date, merchant, amount, category_id,
                    description, statement_file)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
                params![
                    record.date.to_string(),
                    record.merchant,
                    record.amount,
                    record.category_id,
                    record.description,
                    record.statement_file,
                ],
            )?;
            inserted.push(tx.last_insert_rowid());
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<CreditCardTransaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM credit_card_transactions t \
             LEFT JOIN categories c ON c.id = t.category_id WHERE t.id = ?",
            TRANSACTION_COLUMNS
        );
        let transaction = conn
            .query_row(&sql, params![id], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(transaction)
    }

    /// List transactions, newest first, optionally filtered by status
    pub fn list_transactions(
        &self,
        status: Option<TransactionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CreditCardTransaction>> {
        let conn = self.conn()?;

        let (where_clause, mut values): (&str, Vec<Box<dyn rusqlite::ToSql>>) = match status {
            Some(s) => ("WHERE t.status = ?", vec![Box::new(s.as_str().to_string())]),
            None => ("", Vec::new()),
        };
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        let sql = format!(
            "SELECT {} FROM credit_card_transactions t \
             LEFT JOIN categories c ON c.id = t.category_id \
             {} ORDER BY t.date DESC, t.id DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let transactions = stmt
            .query_map(value_refs.as_slice(), |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count transactions, optionally filtered by status
    pub fn count_transactions(&self, status: Option<TransactionStatus>) -> Result<i64> {
        let conn = self.conn()?;
        let count = match status {
            Some(s) => conn.query_row(
                "SELECT COUNT(*) FROM credit_card_transactions WHERE status = ?",
                params![s.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM credit_card_transactions",
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Create an expense from an unmatched transaction and mark it matched.
    /// Runs as a single transaction; returns the new expense ID.
    pub fn create_expense_from_transaction(&self, transaction_id: i64) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let row: Option<(String, String, f64, Option<i64>, Option<String>, String)> = tx
            .query_row(
                "SELECT date, merchant, amount, category_id, description, status
                 FROM credit_card_transactions WHERE id = ?",
                params![transaction_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let (date, merchant, amount, category_id, description, status) = row
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", transaction_id)))?;

        if status == TransactionStatus::Matched.as_str() {
            return Err(Error::InvalidData(
                "Transaction is already matched".to_string(),
            ));
        }

        tx.execute(
            r#"
            INSERT INTO expenses (merchant, amount, date, description, category_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![merchant, amount, date, description, category_id],
        )?;
        let expense_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE credit_card_transactions SET status = 'matched', matched_expense_id = ?
             WHERE id = ?",
            params![expense_id, transaction_id],
        )?;

        tx.commit()?;
        Ok(expense_id)
    }

    /// Pair unmatched transactions to existing expenses.
    ///
    /// The whole pass runs inside one SQLite transaction: concurrent runs
    /// serialize on the write lock, and a claim (link expense + mark
    /// transaction) commits atomically. Expenses already linked by any
    /// transaction — including earlier pairings in this run — are excluded
    /// from the candidate query, so an expense can be claimed at most once.
    pub fn run_auto_match(&self, config: &MatchConfig) -> Result<MatchSummary> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let unmatched: Vec<(i64, NaiveDate, String, f64)> = {
            let mut stmt = tx.prepare(
                "SELECT id, date, merchant, amount FROM credit_card_transactions
                 WHERE status = 'unmatched' ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let date_str: String = row.get(1)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut matched = 0usize;

        for (transaction_id, date, merchant, amount) in &unmatched {
            let window_start = *date - Duration::days(config.date_window_days);
            let window_end = *date + Duration::days(config.date_window_days);
            let amount_low = amount * (1.0 - config.amount_tolerance);
            let amount_high = amount * (1.0 + config.amount_tolerance);

            let candidates: Vec<(i64, String)> = {
                let mut stmt = tx.prepare(
                    "SELECT id, merchant FROM expenses
                     WHERE date >= ? AND date <= ?
                       AND amount >= ? AND amount <= ?
                       AND id NOT IN (
                           SELECT matched_expense_id FROM credit_card_transactions
                           WHERE matched_expense_id IS NOT NULL)
                     ORDER BY date, id",
                )?;
                let rows = stmt
                    .query_map(
                        params![
                            window_start.to_string(),
                            window_end.to_string(),
                            amount_low,
                            amount_high
                        ],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                    )?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            };

            for (expense_id, expense_merchant) in candidates {
                if merchants_similar(merchant, &expense_merchant, config.token_overlap) {
                    tx.execute(
                        "UPDATE credit_card_transactions
                         SET status = 'matched', matched_expense_id = ? WHERE id = ?",
                        params![expense_id, transaction_id],
                    )?;
                    matched += 1;
                    break;
                }
            }
        }

        tx.commit()?;

        Ok(MatchSummary {
            total_transactions: unmatched.len(),
            matched,
            unmatched: unmatched.len() - matched,
        })
    }

    /// Status, monthly, category, and merchant breakdowns for the
    /// credit-card analytics endpoint
    pub fn transaction_analytics(&self) -> Result<TransactionAnalytics> {
        let conn = self.conn()?;

        let status_breakdown = {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*), COALESCE(SUM(amount), 0)
                 FROM credit_card_transactions GROUP BY status",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let status_str: String = row.get(0)?;
                    Ok(StatusBreakdown {
                        status: status_str.parse().unwrap_or_default(),
                        count: row.get(1)?,
                        total_amount: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let monthly_trends = {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', date), COUNT(*), COALESCE(SUM(amount), 0)
                 FROM credit_card_transactions GROUP BY strftime('%Y-%m', date) ORDER BY 1",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MonthlyTrend {
                        month: row.get(0)?,
                        count: row.get(1)?,
                        total_amount: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let category_breakdown = {
            let mut stmt = conn.prepare(
                "SELECT c.name, COUNT(*), COALESCE(SUM(t.amount), 0)
                 FROM credit_card_transactions t
                 JOIN categories c ON c.id = t.category_id
                 GROUP BY c.id, c.name",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryTrend {
                        category: row.get(0)?,
                        count: row.get(1)?,
                        total_amount: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let top_merchants = {
            let mut stmt = conn.prepare(
                "SELECT merchant, COUNT(*), COALESCE(SUM(amount), 0)
                 FROM credit_card_transactions
                 GROUP BY merchant ORDER BY SUM(amount) DESC LIMIT 10",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MerchantTrend {
                        merchant: row.get(0)?,
                        count: row.get(1)?,
                        total_amount: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(TransactionAnalytics {
            status_breakdown,
            monthly_trends,
            category_breakdown,
            top_merchants,
        })
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<CreditCardTransaction> {
        let date_str: String = row.get(1)?;
        let status_str: String = row.get(7)?;
        let created_at_str: String = row.get(10)?;

        Ok(CreditCardTransaction {
            id: row.get(0)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            merchant: row.get(2)?,
            amount: row.get(3)?,
            category_id: row.get(4)?,
            category: row.get(5)?,
            description: row.get(6)?,
            status: status_str.parse().unwrap_or_default(),
            matched_expense_id: row.get(8)?,
            statement_file: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
