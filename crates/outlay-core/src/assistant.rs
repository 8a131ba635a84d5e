//! Conversational assistant over the expense data
//!
//! Builds a plain-text snapshot of the current aggregates and forwards
//! it, together with the user's question, to the model. The model's
//! answer is returned verbatim.

use serde::Serialize;

use crate::ai::{AiBackend, AiClient};
use crate::db::{CategorySpend, Database, MerchantSpend};
use crate::error::Result;
use crate::models::Expense;

/// Starter questions surfaced by the suggestions endpoint
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "What was my total spending last month?",
    "Which category do I spend the most on?",
    "Show me my top 5 merchants by spending",
    "How much did I spend on meals this month?",
    "What's my average expense amount?",
    "Which expenses are pending reimbursement?",
    "How does this month compare to last month?",
    "What are my largest expenses this year?",
];

/// Aggregate snapshot rendered into the model's context block
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSnapshot {
    pub total_expenses: f64,
    pub this_month_expenses: f64,
    pub expense_count: i64,
    pub recent_expenses: Vec<Expense>,
    pub category_totals: Vec<CategorySpend>,
    pub top_merchants: Vec<MerchantSpend>,
}

impl ExpenseSnapshot {
    /// Load the snapshot aggregates from the database
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            total_expenses: db.total_expense_amount()?,
            this_month_expenses: db.this_month_expense_amount()?,
            expense_count: db.count_expenses()?,
            recent_expenses: db.recent_expenses(5)?,
            category_totals: db.category_totals(None)?,
            top_merchants: db.merchant_spending(5)?,
        })
    }

    /// Render the snapshot as the context block for prompts
    pub fn render(&self) -> String {
        let mut context = format!(
            "Current Expense Data Summary:\n\
             - Total expenses: ${:.2}\n\
             - This month's expenses: ${:.2}\n\
             - Total number of expenses: {}\n\n\
             Recent Expenses:\n",
            self.total_expenses, self.this_month_expenses, self.expense_count
        );

        for expense in &self.recent_expenses {
            let category = expense
                .category
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or("No category");
            context.push_str(&format!(
                "- {}: ${:.2} on {} ({})\n",
                expense.merchant, expense.amount, expense.date, category
            ));
        }

        context.push_str("\nCategory Breakdown:\n");
        for category in &self.category_totals {
            context.push_str(&format!("- {}: ${:.2}\n", category.name, category.amount));
        }

        context.push_str("\nTop Merchants:\n");
        for merchant in &self.top_merchants {
            context.push_str(&format!(
                "- {}: ${:.2}\n",
                merchant.merchant, merchant.amount
            ));
        }

        context
    }
}

/// Answer a user question with the current data snapshot as context
pub async fn chat(ai: &AiClient, db: &Database, message: &str) -> Result<String> {
    let snapshot = ExpenseSnapshot::load(db)?;
    ai.answer_question(message, &snapshot.render()).await
}

/// Generate automatic insights over the current data snapshot
pub async fn insights(ai: &AiClient, db: &Database) -> Result<Vec<String>> {
    let snapshot = ExpenseSnapshot::load(db)?;
    ai.spending_insights(&snapshot.render()).await
}
