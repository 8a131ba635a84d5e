//! HTTP request handlers organized by domain

pub mod analytics;
pub mod assistant;
pub mod credit_card;
pub mod expenses;
pub mod receipts;
pub mod review;

// Re-export all handlers for use in router
pub use analytics::*;
pub use assistant::*;
pub use credit_card::*;
pub use expenses::*;
pub use receipts::*;
pub use review::*;
