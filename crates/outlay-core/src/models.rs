//! Domain models for Outlay

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default categories seeded into a fresh database: (name, hex color)
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Meals Dining", "#f59e0b"),
    ("Transportation", "#8b5cf6"),
    ("Office Supplies", "#10b981"),
    ("Software Subscriptions", "#3b82f6"),
    ("Accommodation", "#ec4899"),
    ("Entertainment", "#ef4444"),
    ("Healthcare", "#06b6d4"),
    ("Education", "#84cc16"),
    ("Utilities", "#f97316"),
    ("Other", "#6b7280"),
];

/// Default color assigned to categories created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// An expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Reimbursement workflow state of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReimbursementStatus {
    #[default]
    Pending,
    Approved,
    Reimbursed,
}

impl ReimbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Reimbursed => "reimbursed",
        }
    }
}

impl std::str::FromStr for ReimbursementStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "reimbursed" => Ok(Self::Reimbursed),
            _ => Err(format!("Unknown reimbursement status: {}", s)),
        }
    }
}

impl std::fmt::Display for ReimbursementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification state of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub merchant: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    /// Joined category row, when one is linked
    pub category: Option<Category>,
    pub receipt_id: Option<i64>,
    pub reimbursement_status: ReimbursementStatus,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an expense
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub merchant: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub receipt_id: Option<i64>,
    pub reimbursement_status: ReimbursementStatus,
    pub verification_status: VerificationStatus,
}

/// Human review state of a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown review status: {}", s)),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File types accepted for receipt upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFileType {
    Png,
    Jpg,
    Jpeg,
    Gif,
    Pdf,
}

impl ReceiptFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Pdf => "pdf",
        }
    }

    /// Whether the type can be sent to the vision model.
    /// PDF uploads are stored but extraction refuses them.
    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// MIME type used in vision data URLs
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Pdf => "application/pdf",
        }
    }
}

impl std::str::FromStr for ReceiptFileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" => Ok(Self::Jpg),
            "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "pdf" => Ok(Self::Pdf),
            _ => Err(format!("Unsupported file type: {}", s)),
        }
    }
}

impl std::fmt::Display for ReceiptFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An uploaded receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub file_type: ReceiptFileType,
    /// Model-extracted fields, written on each (re)process
    pub extracted_data: Option<serde_json::Value>,
    pub is_processed: bool,
    pub review_status: ReviewStatus,
    /// Human-corrected overlay from the review workflow
    pub reviewed_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a receipt
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub filename: String,
    pub file_path: String,
    pub file_type: ReceiptFileType,
    pub content_hash: String,
}

/// Matching state of a credit-card transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Unmatched,
    Matched,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unmatched" => Ok(Self::Unmatched),
            "matched" => Ok(Self::Matched),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A credit-card transaction imported from a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardTransaction {
    pub id: i64,
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: f64,
    pub category_id: Option<i64>,
    /// Name of the joined category, when one is linked
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub matched_expense_id: Option<i64>,
    pub statement_file: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a credit-card transaction
#[derive(Debug, Clone)]
pub struct NewCreditCardTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub statement_file: Option<String>,
}
