//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use outlay_core::ai::AiClient;
use outlay_core::db::Database;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "X-OUTLAY-TEST-BOUNDARY";

fn setup_test_app() -> (Router, TempDir) {
    let uploads = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        uploads_dir: uploads.path().to_path_buf(),
        match_config: Default::default(),
    };
    let app = create_router_with_ai(db, None, config, Some(AiClient::mock()));
    (app, uploads)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content_type, content)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ========== Category API Tests ==========

#[tokio::test]
async fn test_default_categories_seeded() {
    let (app, _uploads) = setup_test_app();

    let response = app.oneshot(get_request("/api/categories")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 10);
    assert!(categories.iter().any(|c| c["name"] == "Meals Dining"));
}

#[tokio::test]
async fn test_create_category() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categories",
            serde_json::json!({"name": "Travel", "color": "#ff0000"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Travel");
    assert_eq!(json["color"], "#ff0000");
}

#[tokio::test]
async fn test_create_category_default_color() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categories",
            serde_json::json!({"name": "Misc"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["color"], "#6366f1");
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_expense_crud() {
    let (app, _uploads) = setup_test_app();

    // Create
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            serde_json::json!({
                "merchant": "Coffee Shop",
                "amount": 4.5,
                "date": "2024-01-15",
                "description": "Morning coffee"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = get_body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["merchant"], "Coffee Shop");
    assert_eq!(created["reimbursement_status"], "pending");

    // Read
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/expenses/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Update (partial)
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/expenses/{}", id),
            serde_json::json!({"amount": 5.0, "reimbursement_status": "approved"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["amount"], 5.0);
    assert_eq!(updated["merchant"], "Coffee Shop");
    assert_eq!(updated["reimbursement_status"], "approved");

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/expenses/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!("/api/expenses/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_expense_missing_fields_rejected() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            serde_json::json!({"amount": 4.5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("merchant"));
}

#[tokio::test]
async fn test_unknown_status_value_rejected() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            serde_json::json!({
                "merchant": "Shop",
                "amount": 1.0,
                "date": "2024-01-15",
                "reimbursement_status": "maybe"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expense_filters() {
    let (app, _uploads) = setup_test_app();

    for (merchant, date) in [
        ("Coffee Shop", "2024-01-15"),
        ("Bookstore", "2024-02-20"),
        ("Coffee Roasters", "2024-03-05"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/expenses",
                serde_json::json!({"merchant": merchant, "amount": 10.0, "date": date}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/expenses?merchant=coffee"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/expenses?start_date=2024-02-01&end_date=2024-02-28",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["merchant"], "Bookstore");

    let response = app
        .oneshot(get_request("/api/expenses?start_date=bogus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Statement Upload Tests ==========

#[tokio::test]
async fn test_statement_upload_end_to_end() {
    let (app, _uploads) = setup_test_app();

    let csv = "Date,Description,Amount\n01/15/2024,Coffee Shop,4.50\n";
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.csv",
            "text/csv",
            csv.as_bytes(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["transactions_imported"], 1);
    assert_eq!(json["rows_skipped"], 0);
    assert_eq!(json["filename"], "statement.csv");

    let response = app
        .oneshot(get_request("/api/credit-card/transactions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let transactions = json["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["merchant"], "Coffee Shop");
    assert_eq!(transactions[0]["date"], "2024-01-15");
    assert_eq!(transactions[0]["amount"], 4.5);
    assert_eq!(transactions[0]["status"], "unmatched");
}

#[tokio::test]
async fn test_statement_upload_reports_skipped_rows() {
    let (app, _uploads) = setup_test_app();

    let csv = "Date,Description,Amount\n\
               01/15/2024,Coffee Shop,4.50\n\
               garbage,Coffee Shop,4.50\n";
    let response = app
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.csv",
            "text/csv",
            csv.as_bytes(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["transactions_imported"], 1);
    assert_eq!(json["rows_skipped"], 1);
}

#[tokio::test]
async fn test_statement_upload_rejects_unknown_extension() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.xlsx",
            "application/octet-stream",
            b"whatever",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_statement_upload_auto_matches_existing_expense() {
    let (app, _uploads) = setup_test_app();

    // Expense two days after the statement date, 3% off in amount,
    // same merchant: inside every tolerance
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            serde_json::json!({"merchant": "Coffee Shop", "amount": 4.63, "date": "2024-01-17"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let csv = "Date,Description,Amount\n01/15/2024,Coffee Shop,4.50\n";
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.csv",
            "text/csv",
            csv.as_bytes(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["auto_match_results"]["matched"], 1);

    // A second pass has nothing left to consider
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credit-card/run-auto-match")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["results"]["total_transactions"], 0);
    assert_eq!(json["results"]["matched"], 0);
}

#[tokio::test]
async fn test_transaction_create_expense_and_conflict() {
    let (app, _uploads) = setup_test_app();

    let csv = "Date,Description,Amount\n01/15/2024,Coffee Shop,4.50\n";
    app.clone()
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.csv",
            "text/csv",
            csv.as_bytes(),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/credit-card/transactions"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["transactions"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/credit-card/transactions/{}/create-expense", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["expense_id"].as_i64().unwrap() > 0);

    // Already matched
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/credit-card/transactions/{}/create-expense", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown id
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credit-card/transactions/9999/create-expense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_status_filter_validation() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(get_request("/api/credit-card/transactions?status=bogus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/api/credit-card/transactions?status=matched"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_credit_card_analytics() {
    let (app, _uploads) = setup_test_app();

    let csv = "Date,Description,Amount\n\
               01/15/2024,Coffee Shop,4.50\n\
               02/20/2024,Bookstore,20.00\n";
    app.clone()
        .oneshot(multipart_request(
            "/api/credit-card/upload-statement",
            "statement.csv",
            "text/csv",
            csv.as_bytes(),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/credit-card/analytics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["monthly_trends"].as_array().unwrap().len(), 2);
    assert_eq!(json["top_merchants"][0]["merchant"], "Bookstore");
}

// ========== Receipt API Tests ==========

#[tokio::test]
async fn test_receipt_upload_extracts_fields() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"fake image bytes",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["filename"], "lunch.jpg");
    assert_eq!(json["extracted_data"]["merchant"], "Mock Cafe");
    assert_eq!(json["extracted_data"]["amount"], 42.5);
    assert_eq!(json["extracted_data"]["category"], "Meals Dining");
}

#[tokio::test]
async fn test_receipt_duplicate_upload_conflicts() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"same bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch-again.jpg",
            "image/jpeg",
            b"same bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pdf_receipt_soft_fails() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "invoice.pdf",
            "application/pdf",
            b"%PDF-1.4 fake",
        ))
        .await
        .unwrap();

    // Stored, but extraction is refused with a zero-confidence result
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["extracted_data"]["confidence"], 0.0);
    assert!(json["extracted_data"]["error"].is_string());
}

#[tokio::test]
async fn test_receipt_unsupported_extension_rejected() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "notes.docx",
            "application/octet-stream",
            b"doc",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_receipt_delete_removes_file() {
    let (app, uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"bytes to delete",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["receipt_id"].as_i64().unwrap();

    let stored: Vec<_> = std::fs::read_dir(uploads.path()).unwrap().collect();
    assert_eq!(stored.len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/receipts/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored: Vec<_> = std::fs::read_dir(uploads.path()).unwrap().collect();
    assert!(stored.is_empty());

    let response = app
        .oneshot(get_request(&format!("/api/receipts/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_expense_from_receipt() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"receipt bytes",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["receipt_id"].as_i64().unwrap();

    // Override the amount; everything else comes from the extraction
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/receipts/{}/create-expense", id),
            serde_json::json!({"amount": 40.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let expense = get_body_json(response).await;
    assert_eq!(expense["merchant"], "Mock Cafe");
    assert_eq!(expense["amount"], 40.0);
    assert_eq!(expense["receipt_id"], id);
    assert_eq!(expense["category"]["name"], "Meals Dining");
}

#[tokio::test]
async fn test_receipt_update_data_merges() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"receipt bytes",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["receipt_id"].as_i64().unwrap();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/receipts/{}/update-data", id),
            serde_json::json!({"extracted_data": {"amount": 45.0}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["extracted_data"]["amount"], 45.0);
    // Untouched fields survive the merge
    assert_eq!(json["extracted_data"]["merchant"], "Mock Cafe");
}

// ========== Receipt Review Tests ==========

#[tokio::test]
async fn test_review_workflow() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "lunch.jpg",
            "image/jpeg",
            b"review me",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["receipt_id"].as_i64().unwrap();

    // Pending queue contains the new receipt
    let response = app
        .clone()
        .oneshot(get_request("/api/receipt-review/pending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["receipts"][0]["id"], id);

    // Details include the category list for the dropdown
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/receipt-review/{}", id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["available_categories"].as_array().unwrap().len(), 10);

    // Approve with corrected data
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/receipt-review/{}/approve", id),
            serde_json::json!({"reviewed_data": {
                "merchant": "Corrected Cafe",
                "amount": 41.0,
                "date": "2024-03-01",
                "category": "Meals Dining"
            }}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["receipt"]["review_status"], "approved");
    assert_eq!(json["expense"]["merchant"], "Corrected Cafe");
    assert_eq!(json["expense"]["verification_status"], "verified");

    // Queue is empty, stats reflect the approval
    let response = app
        .clone()
        .oneshot(get_request("/api/receipt-review/pending"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 0);

    let response = app
        .oneshot(get_request("/api/receipt-review/stats"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["total_receipts"], 1);
    assert_eq!(json["approved_receipts"], 1);
    assert_eq!(json["approval_rate"], 100.0);
}

#[tokio::test]
async fn test_review_reject() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/receipts/upload",
            "bad.jpg",
            "image/jpeg",
            b"reject me",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["receipt_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/receipt-review/{}/reject", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["receipt"]["review_status"], "rejected");
}

// ========== AI Assistant Tests ==========

#[tokio::test]
async fn test_chat_with_mock_backend() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/ai-assistant/chat",
            serde_json::json!({"message": "What did I spend?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["response"]
        .as_str()
        .unwrap()
        .contains("What did I spend?"));
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_requires_message() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/ai-assistant/chat",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/ai-assistant/chat",
            serde_json::json!({"message": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_without_backend_is_bad_request() {
    let uploads = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        uploads_dir: uploads.path().to_path_buf(),
        match_config: Default::default(),
    };
    let app = create_router_with_ai(db, None, config, None);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/ai-assistant/chat",
            serde_json::json!({"message": "hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insights_and_suggestions() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .clone()
        .oneshot(get_request("/api/ai-assistant/insights"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["insights"].as_array().unwrap().len(), 3);

    let response = app
        .oneshot(get_request("/api/ai-assistant/suggestions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["suggestions"].as_array().unwrap().len(), 8);
}

// ========== Analytics Tests ==========

#[tokio::test]
async fn test_analytics_endpoints() {
    let (app, _uploads) = setup_test_app();

    for (merchant, amount, date) in [
        ("Coffee Shop", 10.0, "2024-01-15"),
        ("Coffee Shop", 30.0, "2024-02-10"),
        ("Bookstore", 20.0, "2024-02-11"),
    ] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/expenses",
                serde_json::json!({"merchant": merchant, "amount": amount, "date": date}),
            ))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/analytics/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total_expenses"], 60.0);
    assert_eq!(json["recent_expenses"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(get_request("/api/analytics/monthly-spending"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["month"], "2024-01");
    assert_eq!(json[0]["total"], 10.0);

    let response = app
        .oneshot(get_request("/api/analytics/merchant-spending"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json[0]["merchant"], "Coffee Shop");
    assert_eq!(json[0]["amount"], 40.0);
}

// ========== CORS ==========

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _uploads) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .header("origin", "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
