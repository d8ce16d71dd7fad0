//! PDF upload endpoint

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::time::Instant;

use crate::config::PDF_CONTENT_TYPE;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// POST /upload - Store a PDF and ingest it into the vector index
///
/// The filename is both the object key and the document id.
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let start = Instant::now();
    let mut multipart = multipart?;
    let limit = state.config().server.max_upload_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Reject before anything is stored
        if !is_pdf(field.content_type()) {
            return Err(Error::validation("Only PDF files are allowed."));
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::validation("Uploaded file has no filename."))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| read_error(e, limit))?;

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        let locator = state
            .object_store()
            .put(&filename, PDF_CONTENT_TYPE, data.to_vec())
            .await
            .map_err(Error::upload_failed)?;

        let document_id = filename.clone();
        let chunks_stored = state
            .pipeline()
            .ingest(&locator, &document_id)
            .await
            .map_err(Error::upload_failed)?;

        tracing::info!(
            "Processed {} -> {} chunks in {:.1}s",
            filename,
            chunks_stored,
            start.elapsed().as_secs_f64()
        );

        return Ok(Json(UploadResponse::success(
            filename,
            locator,
            document_id,
            chunks_stored,
        )));
    }

    Err(Error::validation("Missing 'file' field."))
}

/// Oversized bodies become 413; anything else is a malformed request
fn read_error(err: MultipartError, limit: usize) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::rejected(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File exceeds the upload limit of {} bytes.", limit),
        )
    } else {
        Error::validation(format!("Failed to read file: {}", err.body_text()))
    }
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Keep only the final path component of a client-supplied filename
fn sanitize_filename(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
