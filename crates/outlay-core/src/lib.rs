//! Outlay Core Library
//!
//! Shared functionality for the Outlay expense tracker:
//! - Database access and migrations
//! - Credit-card statement parsing (CSV and AI-assisted free text)
//! - Transaction-to-expense matching heuristics
//! - AI backend abstraction (receipt extraction, categorization, assistant)
//! - Expense-data snapshot assembly for assistant prompts

pub mod ai;
pub mod assistant;
pub mod db;
pub mod error;
pub mod matcher;
pub mod models;
pub mod prompts;
pub mod statement;

pub use ai::{AiBackend, AiClient, ExtractedReceipt, MockBackend, OpenAiBackend};
pub use assistant::{ExpenseSnapshot, SUGGESTED_QUESTIONS};
pub use db::Database;
pub use error::{Error, Result};
pub use matcher::{merchants_similar, MatchConfig};
pub use statement::{parse_csv_statement, ParsedStatement, StatementTransaction};
