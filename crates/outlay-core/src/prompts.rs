//! Fixed prompt builders for the model API
//!
//! Each AI operation sends a fixed instruction; the only variable parts
//! are the data snippets interpolated here. Free-text statement input is
//! truncated so a pathological upload cannot blow the context window.

/// Maximum characters of statement text forwarded to the model
const STATEMENT_TEXT_LIMIT: usize = 4000;

/// Instruction for receipt field extraction (vision)
pub fn receipt_extraction() -> String {
    r#"Analyze this receipt image and extract the following information in JSON format:

{
    "merchant": "Name of the business/merchant",
    "amount": "Total amount as a number (e.g., 25.99)",
    "date": "Date in YYYY-MM-DD format",
    "items": ["List of items purchased"],
    "category": "Suggested expense category (e.g., 'Meals Dining', 'Transportation', 'Office Supplies', 'Software Subscriptions', 'Accommodation', 'Entertainment', 'Healthcare', 'Education', 'Utilities', 'Other')",
    "tax": "Tax amount as a number if visible",
    "tip": "Tip amount as a number if visible",
    "payment_method": "Payment method if visible (e.g., 'Credit Card', 'Cash', 'Debit Card')",
    "address": "Business address if visible",
    "phone": "Business phone number if visible",
    "confidence": "Confidence level from 0.0 to 1.0 for the extraction accuracy"
}

If any information is not clearly visible or cannot be determined, use null for that field.
Make sure the amount is the total amount paid.
For the category, choose the most appropriate one from the list provided."#
        .to_string()
}

/// System instruction for free-text statement extraction
pub fn statement_extraction_system() -> String {
    r#"You are a financial data extraction expert. Extract credit card transactions from the provided text.
Return a JSON array of transactions with the following format:
[
  {
    "date": "YYYY-MM-DD",
    "merchant": "Merchant Name",
    "amount": 123.45,
    "description": "Transaction description"
  }
]

Rules:
- Only extract actual transactions (ignore headers, totals, etc.)
- Use positive amounts for all transactions
- Parse dates to YYYY-MM-DD format
- Clean up merchant names (remove extra spaces, codes)
- If you can't parse a transaction clearly, skip it"#
        .to_string()
}

/// User message for free-text statement extraction
pub fn statement_extraction_user(text: &str) -> String {
    let snippet: String = text.chars().take(STATEMENT_TEXT_LIMIT).collect();
    format!(
        "Extract transactions from this credit card statement:\n\n{}",
        snippet
    )
}

/// System instruction for transaction categorization
pub fn categorize_system(categories: &[String]) -> String {
    format!(
        r#"You are a transaction categorization expert. Categorize the transaction based on the merchant and description.

Available categories: {}

Return only the category name that best matches the transaction. If no category fits well, return "Other"."#,
        categories.join(", ")
    )
}

/// User message for transaction categorization
pub fn categorize_user(merchant: &str, description: &str) -> String {
    format!("Merchant: {}\nDescription: {}", merchant, description)
}

/// System instruction for the conversational assistant
pub fn chat_system(context: &str) -> String {
    format!(
        r#"You are an AI assistant for an expense management application called Outlay.
You help users understand and analyze their expense data.

Current user's expense data:
{}

Guidelines:
- Be helpful and conversational
- Provide specific insights based on the actual data
- If asked about data not available, explain what data is available
- Suggest actionable insights when appropriate
- Keep responses concise but informative
- Use dollar amounts and percentages when relevant
- If the user asks about trends, explain what you can see from the data"#,
        context
    )
}

/// Instruction for automatic spending insights
pub fn insights(context: &str) -> String {
    format!(
        r#"Based on the following expense data, provide 3-5 brief insights or observations about the user's spending patterns.
Each insight should be one sentence and actionable or informative.

{}

Format as a simple list of insights."#,
        context
    )
}
