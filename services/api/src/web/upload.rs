//! services/api/src/web/upload.rs
//!
//! Multipart upload endpoint: persists the file and its metadata record,
//! imports tabular rows for the supported file types, and updates the
//! metadata with the processing outcome.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use bankchat_core::domain::{FileType, UploadedFile};

use crate::adapters::ingest;
use crate::web::state::AppState;
use crate::web::{error_body, port_error_response};

/// POST /api/upload - upload and process a tabular data file.
///
/// Expects multipart form fields `file`, `file_type` and `customer_id`. File
/// types without import behavior are still accepted and stored; they import
/// zero records.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content_type = "multipart/form-data", description = "file, file_type and customer_id fields"),
    responses(
        (status = 201, description = "File stored and processed"),
        (status = 400, description = "Missing or invalid form fields"),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Processing failed")
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut file_type_field: Option<String> = None;
    let mut customer_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            error_body(format!("Failed to read multipart data: {e}")),
        )
    })? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.csv").to_string();
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        error_body(format!("Failed to read file bytes: {e}")),
                    )
                })?;
                file = Some((name, data.to_vec()));
            }
            Some("file_type") => {
                file_type_field = Some(read_text_field(field).await?);
            }
            Some("customer_id") => {
                customer_id = Some(read_text_field(field).await?);
            }
            _ => {}
        }
    }

    let (file_name, data) = file.ok_or_else(|| {
        (StatusCode::BAD_REQUEST, error_body("No file provided"))
    })?;
    let (file_type_raw, customer_id) = match (file_type_field, customer_id) {
        (Some(file_type), Some(customer_id)) => (file_type, customer_id),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                error_body("file_type and customer_id are required"),
            ))
        }
    };
    let file_type: FileType = file_type_raw.parse().map_err(|e: String| {
        (StatusCode::BAD_REQUEST, error_body(e))
    })?;

    // The owning customer must exist before anything is written.
    state
        .store
        .get_customer(&customer_id)
        .await
        .map_err(port_error_response)?;

    // Persist the raw file under the configured upload directory.
    let stored_name = format!("{}_{}", Uuid::new_v4(), file_name);
    let stored_path = state.config.upload_dir.join(&stored_name);
    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| {
            error!("failed to create upload directory: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to store file"),
            )
        })?;
    tokio::fs::write(&stored_path, &data).await.map_err(|e| {
        error!("failed to write uploaded file: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Failed to store file"),
        )
    })?;

    let metadata = state
        .store
        .create_uploaded_file(UploadedFile {
            id: Uuid::new_v4(),
            file_name,
            file_type,
            customer_id: customer_id.clone(),
            file_path: stored_path.to_string_lossy().into_owned(),
            uploaded_at: Utc::now(),
            processed: false,
            records_imported: 0,
        })
        .await
        .map_err(port_error_response)?;

    // Only the tabular record types have import behavior; anything else is
    // stored as-is with zero imported rows.
    let records_imported = match file_type {
        FileType::Transaction | FileType::Investment => {
            let rows = ingest::parse_rows(file_type, &data).map_err(|e| {
                error!("upload ingestion failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body(format!("Error processing file: {e}")),
                )
            })?;
            state
                .import
                .import_rows(file_type, &customer_id, rows)
                .await
                .map_err(|e| {
                    error!("upload import failed: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_body(format!("Error processing file: {e}")),
                    )
                })?
        }
        _ => 0,
    };

    state
        .store
        .mark_file_processed(metadata.id, records_imported as i32)
        .await
        .map_err(port_error_response)?;

    info!("processed upload {} ({records_imported} rows)", metadata.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "File uploaded and processed successfully",
            "records_imported": records_imported,
        })),
    ))
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, (StatusCode, Json<Value>)> {
    field.text().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            error_body(format!("Failed to read form field: {e}")),
        )
    })
}
