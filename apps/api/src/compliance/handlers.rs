//! Axum route handlers for the compliance scan API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::accounts::auth::CurrentUser;
use crate::compliance::assembly::{document_name, format_file_size, join_fragments, ScanInput};
use crate::compliance::normalize::DocumentInfo;
use crate::compliance::scanner::run_scan;
use crate::errors::AppError;
use crate::models::compliance::{ComplianceScanRequest, ComplianceScanResponse};
use crate::pdf;
use crate::state::AppState;

const THIN_TEXT_CHARS: usize = 50;

/// POST /api/v1/auth/compliance_scan
pub async fn handle_compliance_scan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ComplianceScanRequest>,
) -> Result<Json<ComplianceScanResponse>, AppError> {
    info!(
        "Compliance scan requested by user {} with {} fragment(s)",
        user.id,
        req.compliance_data.len()
    );

    let text = join_fragments(&req.compliance_data);
    let info = DocumentInfo {
        name: document_name(&req.compliance_data),
        size: format_file_size(text.len() as u64),
    };
    let input = ScanInput::new(text, req.questions, req.user_context.as_ref());

    Ok(Json(run_scan(state.scanner.as_ref(), &input, &info).await))
}

/// The two parts of a PDF scan upload.
struct PdfUpload {
    filename: String,
    bytes: Bytes,
    org_context: String,
}

async fn read_pdf_upload(mut multipart: Multipart) -> Result<PdfUpload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut org_context: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("pdf_file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((filename, bytes));
            }
            Some("org_context") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read org_context: {e}")))?;
                org_context = Some(text);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'pdf_file' field".to_string()))?;
    let org_context = org_context
        .ok_or_else(|| AppError::Validation("Missing 'org_context' field".to_string()))?;

    Ok(PdfUpload {
        filename,
        bytes,
        org_context,
    })
}

/// POST /api/v1/unauth/pdf_compliance_scan
pub async fn handle_pdf_compliance_scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComplianceScanResponse>, AppError> {
    let upload = read_pdf_upload(multipart).await?;
    info!("PDF compliance scan requested for '{}'", upload.filename);

    let organization: Value = serde_json::from_str(&upload.org_context).map_err(|_| {
        warn!("Invalid organization context JSON format");
        AppError::Validation("Invalid organization context JSON format".to_string())
    })?;
    let org_name = organization
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    info!("Organization context parsed: {}", org_name);

    pdf::ensure_pdf_filename(&upload.filename)?;

    let size = format_file_size(upload.bytes.len() as u64);
    info!("File size: {} ({} bytes)", size, upload.bytes.len());

    let filename = upload.filename;
    let bytes = upload.bytes;
    let extracted = tokio::task::spawn_blocking(move || pdf::extract(&filename, &bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))??;

    info!(
        "Extracted {} characters from {} pages",
        extracted.text.len(),
        extracted.page_count
    );
    if extracted.text.trim().len() < THIN_TEXT_CHARS {
        warn!("PDF has very little content: {:?}", extracted.text);
    }
    match &extracted.metadata {
        Some(meta) => info!("PDF metadata: {:?}", meta),
        None => info!("No metadata found in PDF"),
    }

    let context = json!({
        "organization": organization,
        "document": {
            "filename": extracted.filename,
            "size": size,
            "page_count": extracted.page_count,
            "metadata": extracted.metadata,
        }
    });
    let info = DocumentInfo {
        name: extracted.filename.clone(),
        size,
    };
    let input = ScanInput::new(extracted.text, Vec::new(), Some(&context));

    Ok(Json(run_scan(state.scanner.as_ref(), &input, &info).await))
}
