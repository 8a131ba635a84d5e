//! Heuristic matching of credit-card transactions to expenses
//!
//! A transaction matches an expense when the expense date falls within a
//! window around the transaction date, the amounts agree within a relative
//! tolerance, and the merchant names are similar. The thresholds are
//! historical defaults, not tuned values, so they live in a config struct
//! rather than constants.

use chrono::NaiveDate;

/// Matching thresholds
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Candidate window around the transaction date, in days (inclusive)
    pub date_window_days: i64,
    /// Relative amount tolerance (0.05 = ±5%, inclusive)
    pub amount_tolerance: f64,
    /// Minimum shared-token fraction of the smaller merchant token set
    pub token_overlap: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            date_window_days: 3,
            amount_tolerance: 0.05,
            token_overlap: 0.5,
        }
    }
}

impl MatchConfig {
    /// Build a config from environment overrides, falling back to defaults.
    ///
    /// Recognized variables: `OUTLAY_MATCH_WINDOW_DAYS`,
    /// `OUTLAY_MATCH_AMOUNT_TOLERANCE`, `OUTLAY_MATCH_TOKEN_OVERLAP`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            date_window_days: std::env::var("OUTLAY_MATCH_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.date_window_days),
            amount_tolerance: std::env::var("OUTLAY_MATCH_AMOUNT_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.amount_tolerance),
            token_overlap: std::env::var("OUTLAY_MATCH_TOKEN_OVERLAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_overlap),
        }
    }

    /// Whether the expense date lies within the window around the
    /// transaction date.
    pub fn dates_close(&self, transaction_date: NaiveDate, expense_date: NaiveDate) -> bool {
        (transaction_date - expense_date).num_days().abs() <= self.date_window_days
    }

    /// Whether the expense amount lies within the relative tolerance of
    /// the transaction amount (inclusive bounds).
    pub fn amounts_close(&self, transaction_amount: f64, expense_amount: f64) -> bool {
        let low = transaction_amount * (1.0 - self.amount_tolerance);
        let high = transaction_amount * (1.0 + self.amount_tolerance);
        expense_amount >= low && expense_amount <= high
    }

    /// Whether a transaction/expense pair satisfies all three rules
    pub fn is_match(
        &self,
        transaction_date: NaiveDate,
        transaction_amount: f64,
        transaction_merchant: &str,
        expense_date: NaiveDate,
        expense_amount: f64,
        expense_merchant: &str,
    ) -> bool {
        self.dates_close(transaction_date, expense_date)
            && self.amounts_close(transaction_amount, expense_amount)
            && merchants_similar(transaction_merchant, expense_merchant, self.token_overlap)
    }
}

/// Merchant-name similarity, first rule that succeeds wins:
/// exact equality, substring containment, then shared-token overlap
/// (non-empty intersection covering at least `token_overlap` of the
/// smaller token set). Comparison is case-insensitive and trimmed.
pub fn merchants_similar(a: &str, b: &str, token_overlap: f64) -> bool {
    let a = a.to_lowercase().trim().to_string();
    let b = b.to_lowercase().trim().to_string();

    if a == b {
        return true;
    }

    if a.contains(&b) || b.contains(&a) {
        return true;
    }

    let tokens_a: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: std::collections::HashSet<&str> = b.split_whitespace().collect();

    let common = tokens_a.intersection(&tokens_b).count();
    let smaller = tokens_a.len().min(tokens_b.len());

    common > 0 && common as f64 >= smaller as f64 * token_overlap
}
