//! Receipt upload and processing handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::{AppError, AppState, MessageResponse};
use outlay_core::ai::{extract_receipt_fields, ExtractedReceipt, UNKNOWN_MERCHANT};
use outlay_core::models::{NewExpense, NewReceipt, Receipt, ReceiptFileType};

/// Response for receipt upload and reprocessing
#[derive(Debug, Serialize)]
pub struct ReceiptProcessResponse {
    pub receipt_id: i64,
    pub filename: String,
    pub extracted_data: ExtractedReceipt,
    pub message: String,
}

/// Pull the `file` field out of a multipart body
pub(crate) async fn read_upload(
    multipart: &mut Multipart,
) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|f| f.to_string())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::bad_request("No file selected"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Invalid request body or file too large"))?;

        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::bad_request("No file provided"))
}

fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// POST /api/receipts/upload - Upload and process a receipt
pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReceiptProcessResponse>), AppError> {
    let (filename, bytes) = read_upload(&mut multipart).await?;

    let file_type: ReceiptFileType = file_extension(&filename)
        .ok_or_else(|| AppError::bad_request("File type not allowed"))?
        .parse()
        .map_err(|_| AppError::bad_request("File type not allowed"))?;

    if bytes.is_empty() {
        return Err(AppError::bad_request("No file data provided"));
    }

    // Content hash for duplicate detection
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let content_hash = hex::encode(hasher.finalize());

    if let Some(existing) = state.db.get_receipt_by_hash(&content_hash)? {
        return Err(AppError::conflict(&format!(
            "Receipt already exists with ID {}",
            existing.id
        )));
    }

    let uploads_dir = &state.config.uploads_dir;
    if !uploads_dir.exists() {
        std::fs::create_dir_all(uploads_dir)
            .map_err(|e| AppError::internal(&format!("Failed to create uploads directory: {}", e)))?;
    }

    // Unique timestamped filename alongside the original name in the row
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
    let stored_name = format!("receipt_{}.{}", timestamp, file_type);
    let file_path = uploads_dir.join(&stored_name);

    std::fs::write(&file_path, &bytes)
        .map_err(|e| AppError::internal(&format!("Failed to save receipt file: {}", e)))?;

    let receipt_id = state.db.create_receipt(&NewReceipt {
        filename: filename.clone(),
        file_path: file_path.to_string_lossy().to_string(),
        file_type,
        content_hash,
    })?;

    // Extraction soft-fails into a zero-confidence result; the receipt is
    // stored either way and flagged for manual entry.
    let extracted = match &state.ai {
        Some(ai) => extract_receipt_fields(ai, &bytes, file_type).await,
        None => ExtractedReceipt::failure("AI backend not configured", Utc::now().date_naive()),
    };

    let extracted_json = serde_json::to_string(&extracted)
        .map_err(|e| AppError::internal(&format!("Failed to serialize extracted data: {}", e)))?;
    state.db.update_receipt_extracted(receipt_id, &extracted_json)?;

    Ok((
        StatusCode::CREATED,
        Json(ReceiptProcessResponse {
            receipt_id,
            filename,
            extracted_data: extracted,
            message: "Receipt uploaded and processed successfully".to_string(),
        }),
    ))
}

/// GET /api/receipts - List all receipts
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Receipt>>, AppError> {
    Ok(Json(state.db.list_receipts()?))
}

/// GET /api/receipts/:id - Get a specific receipt
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Receipt>, AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    Ok(Json(receipt))
}

/// DELETE /api/receipts/:id - Delete a receipt and its file
pub async fn delete_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    // Remove the file only when it resolves inside the uploads directory
    let file_path = std::path::Path::new(&receipt.file_path);
    if let (Ok(canonical_file), Ok(canonical_dir)) = (
        std::fs::canonicalize(file_path),
        std::fs::canonicalize(&state.config.uploads_dir),
    ) {
        if canonical_file.starts_with(&canonical_dir) {
            let _ = std::fs::remove_file(&canonical_file);
        } else {
            warn!(
                path = %receipt.file_path,
                "Receipt file outside uploads directory, skipping delete"
            );
        }
    }

    state.db.delete_receipt(id)?;

    Ok(Json(MessageResponse::new("Receipt deleted successfully")))
}

/// Request body overrides for creating an expense from a receipt
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptExpenseRequest {
    pub merchant: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// POST /api/receipts/:id/create-expense - Create an expense from extracted data
pub async fn create_expense_from_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<ReceiptExpenseRequest>>,
) -> Result<(StatusCode, Json<outlay_core::models::Expense>), AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    let extracted = receipt
        .extracted_data
        .filter(|_| receipt.is_processed)
        .ok_or_else(|| AppError::bad_request("Receipt not processed or no data available"))?;

    let overrides = body.map(|Json(b)| b).unwrap_or_default();

    let merchant = overrides
        .merchant
        .or_else(|| {
            extracted
                .get("merchant")
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string());

    let amount = overrides
        .amount
        .or_else(|| extracted.get("amount").and_then(|v| v.as_f64()))
        .unwrap_or(0.0);

    let date = overrides
        .date
        .or_else(|| {
            extracted
                .get("date")
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());

    let category_id = match extracted.get("category").and_then(|v| v.as_str()) {
        Some(name) => state.db.get_category_by_name(name)?.map(|c| c.id),
        None => None,
    };

    let expense = NewExpense {
        merchant,
        amount,
        date,
        description: overrides
            .description
            .or_else(|| Some(format!("Receipt: {}", receipt.filename))),
        category_id,
        receipt_id: Some(id),
        ..Default::default()
    };

    let expense_id = state.db.create_expense_from_receipt(id, &expense)?;
    let created = state
        .db
        .get_expense(expense_id)?
        .ok_or_else(|| AppError::internal("Expense not found after creation"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/receipts/:id/reprocess - Re-run extraction on a stored receipt
pub async fn reprocess_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptProcessResponse>, AppError> {
    let receipt = state
        .db
        .get_receipt(id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    let ai = state.ai.as_ref().ok_or_else(|| {
        AppError::bad_request("AI backend not configured. Set OPENAI_API_KEY to enable extraction.")
    })?;

    let bytes = std::fs::read(&receipt.file_path)
        .map_err(|_| AppError::not_found("Receipt file not found"))?;

    let extracted = extract_receipt_fields(ai, &bytes, receipt.file_type).await;

    let extracted_json = serde_json::to_string(&extracted)
        .map_err(|e| AppError::internal(&format!("Failed to serialize extracted data: {}", e)))?;
    state.db.update_receipt_extracted(id, &extracted_json)?;

    Ok(Json(ReceiptProcessResponse {
        receipt_id: id,
        filename: receipt.filename,
        extracted_data: extracted,
        message: "Receipt reprocessed successfully".to_string(),
    }))
}

/// Request body for correcting extracted data
#[derive(Debug, Deserialize)]
pub struct UpdateReceiptDataRequest {
    pub extracted_data: serde_json::Value,
}

/// Response after merging corrections
#[derive(Debug, Serialize)]
pub struct UpdateReceiptDataResponse {
    pub receipt_id: i64,
    pub extracted_data: serde_json::Value,
    pub message: String,
}

/// PUT /api/receipts/:id/update-data - Merge corrected fields into extracted data
pub async fn update_receipt_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateReceiptDataRequest>,
) -> Result<Json<UpdateReceiptDataResponse>, AppError> {
    if state.db.get_receipt(id)?.is_none() {
        return Err(AppError::not_found("Receipt not found"));
    }

    if !body.extracted_data.is_object() {
        return Err(AppError::bad_request("extracted_data must be an object"));
    }

    let merged = state.db.merge_receipt_extracted(id, &body.extracted_data)?;

    Ok(Json(UpdateReceiptDataResponse {
        receipt_id: id,
        extracted_data: merged,
        message: "Receipt data updated successfully".to_string(),
    }))
}
