//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Category operations
//! - `expenses` - Expense CRUD and filtered listing
//! - `receipts` - Receipt workflow operations
//! - `transactions` - Credit-card transactions and the auto-match pass
//! - `analytics` - Aggregate queries for analytics and the assistant

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;
use crate::models::DEFAULT_CATEGORIES;

mod analytics;
mod categories;
mod expenses;
mod receipts;
mod transactions;


pub use analytics::{
    AnalyticsSummary, CategoryBreakdown, CategorySpend, MerchantSpend, MonthlySpend,
};
pub use expenses::ExpenseFilter;
pub use receipts::ReviewStats;
pub use transactions::{
    CategoryTrend, MatchSummary, MerchantTrend, MonthlyTrend, StatusBreakdown,
    TransactionAnalytics,
};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database at the given path, running migrations
    /// and seeding default categories on first use.
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;
        db.seed_default_categories()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each
    /// pooled connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/outlay_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::open(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: safe for most power-loss scenarios
            PRAGMA synchronous = NORMAL;

            -- Categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT '#6366f1',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_categories_name ON categories(name);

            -- Receipts
            -- Defined before expenses because expenses references receipts
            CREATE TABLE IF NOT EXISTS receipts (
                id INTEGER PRIMARY KEY,
                filename TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL,
                extracted_json TEXT,                       -- model output (JSON)
                is_processed BOOLEAN DEFAULT 0,
                review_status TEXT NOT NULL DEFAULT 'pending',
                reviewed_json TEXT,                        -- human-corrected overlay (JSON)
                content_hash TEXT UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_receipts_review_status ON receipts(review_status);
            CREATE INDEX IF NOT EXISTS idx_receipts_created ON receipts(created_at);

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                merchant TEXT NOT NULL,
                amount REAL NOT NULL,
                date DATE NOT NULL,
                description TEXT,
                category_id INTEGER REFERENCES categories(id),
                receipt_id INTEGER REFERENCES receipts(id),
                reimbursement_status TEXT NOT NULL DEFAULT 'pending',
                verification_status TEXT NOT NULL DEFAULT 'pending',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_merchant ON expenses(merchant);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);

            -- Credit-card transactions
            CREATE TABLE IF NOT EXISTS credit_card_transactions (
                id INTEGER PRIMARY KEY,
                date DATE NOT NULL,
                merchant TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                description TEXT,
                status TEXT NOT NULL DEFAULT 'unmatched',  -- unmatched, matched
                matched_expense_id INTEGER REFERENCES expenses(id),
                statement_file TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_cc_transactions_date ON credit_card_transactions(date);
            CREATE INDEX IF NOT EXISTS idx_cc_transactions_status ON credit_card_transactions(status);
            CREATE INDEX IF NOT EXISTS idx_cc_transactions_expense ON credit_card_transactions(matched_expense_id);
            "#,
        )?;

        Ok(())
    }

    /// Insert the default category set if the table is empty
    fn seed_default_categories(&self) -> Result<()> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        for (name, color) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, color) VALUES (?, ?)",
                rusqlite::params![name, color],
            )?;
        }

        info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
        Ok(())
    }
}
