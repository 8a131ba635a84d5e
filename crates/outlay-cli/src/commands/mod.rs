//! CLI command implementations

use std::path::Path;

use anyhow::{Context, Result};

use outlay_core::db::Database;
use outlay_core::matcher::MatchConfig;
use outlay_core::models::{NewCreditCardTransaction, TransactionStatus};
use outlay_core::statement::parse_csv_statement;

/// Open the database, creating it if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::open(path).with_context(|| format!("Failed to open database at {}", path))
}

/// `outlay init`
pub fn cmd_init(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let categories = db.list_categories()?;

    println!("Initialized database at {}", db_path.display());
    println!("  {} categories available", categories.len());
    Ok(())
}

/// `outlay import --file statement.csv`
pub fn cmd_import(db_path: &Path, file: &Path, no_match: bool) -> Result<()> {
    let db = open_db(db_path)?;

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed = parse_csv_statement(content.as_bytes())?;

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    let records: Vec<NewCreditCardTransaction> = parsed
        .transactions
        .iter()
        .map(|tx| NewCreditCardTransaction {
            date: tx.date,
            merchant: tx.merchant.clone(),
            amount: tx.amount,
            category_id: None,
            description: Some(tx.description.clone()),
            statement_file: filename.clone(),
        })
        .collect();

    let inserted = db.save_statement_transactions(&records)?;
    let duplicates = records.len() - inserted.len();

    println!("Imported {} transaction(s)", inserted.len());
    if parsed.skipped > 0 {
        println!("  {} row(s) skipped during parsing", parsed.skipped);
    }
    if duplicates > 0 {
        println!("  {} duplicate(s) ignored", duplicates);
    }

    if !no_match {
        let summary = db.run_auto_match(&MatchConfig::from_env())?;
        println!(
            "Auto-match: {} matched, {} still unmatched",
            summary.matched, summary.unmatched
        );
    }

    Ok(())
}

/// `outlay serve`
pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    uploads_dir: &Path,
) -> Result<()> {
    let db = open_db(db_path)?;

    println!("Starting Outlay web server...");
    println!("  Database:  {}", db_path.display());
    println!("  Listening: http://{}:{}", host, port);
    println!("  Uploads:   {}", uploads_dir.display());
    if let Some(dir) = static_dir {
        println!("  Static:    {}", dir.display());
    }

    let config = outlay_server::ServerConfig {
        uploads_dir: uploads_dir.to_path_buf(),
        match_config: MatchConfig::from_env(),
    };

    let static_dir = static_dir.map(|p| p.to_string_lossy().to_string());
    outlay_server::serve(db, host, port, static_dir.as_deref(), config).await
}

/// `outlay status`
pub fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;

    let expenses = db.count_expenses()?;
    let receipts = db.count_receipts()?;
    let transactions = db.count_transactions(None)?;
    let unmatched = db.count_transactions(Some(TransactionStatus::Unmatched))?;
    let review = db.review_stats()?;
    let total = db.total_expense_amount()?;

    println!("Database: {}", db_path.display());
    println!("  Expenses:     {} (${:.2} total)", expenses, total);
    println!("  Receipts:     {} ({} pending review)", receipts, review.pending_receipts);
    println!(
        "  Transactions: {} ({} unmatched)",
        transactions, unmatched
    );

    Ok(())
}
