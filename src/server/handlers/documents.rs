//! Document upload and index loading handlers.

use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use super::super::AppState;
use super::pages::error_page;
use crate::extract::is_pdf;
use crate::index::{IndexError, VectorIndex};
use crate::pipeline::{no_progress, IndexSummary};
use crate::qa::QaError;
use crate::utils::format_size;

const UPLOAD_FIELD: &str = "file";

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Take the `file` field from a multipart form.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("upload.pdf")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| e.to_string())?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload {
            file_name,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

fn processed_notice(summary: &IndexSummary) -> String {
    format!(
        "Processed {}: {} pages, {} text blocks, {} tables, {} image OCR blocks, {} passages",
        summary.source.file_name,
        summary.page_count,
        summary.text_items + summary.page_ocr_items,
        summary.table_items,
        summary.image_items,
        summary.passages
    )
}

fn qa_error_status(e: &QaError) -> StatusCode {
    match e {
        QaError::Index(IndexError::NotFound(_)) => StatusCode::NOT_FOUND,
        QaError::Index(IndexError::EmbeddingMismatch { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Upload a PDF and index it in memory. The chat starts over.
pub async fn process_document(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return error_page(
                StatusCode::BAD_REQUEST,
                "No File",
                "Choose a PDF file to upload.",
            )
        }
        Err(e) => return error_page(StatusCode::BAD_REQUEST, "Upload Failed", &e),
    };

    if !is_pdf(&upload.bytes) {
        return error_page(
            StatusCode::BAD_REQUEST,
            "Not a PDF",
            &format!("{} is not a PDF file.", upload.file_name),
        );
    }

    // The temp dir lives until processing finishes
    let tmp = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            return error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Processing Failed",
                &format!("Failed to create temp dir: {}", e),
            )
        }
    };
    let pdf_path = tmp.path().join(&upload.file_name);
    if let Err(e) = tokio::fs::write(&pdf_path, &upload.bytes).await {
        return error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Processing Failed",
            &format!("Failed to save upload: {}", e),
        );
    }

    info!(
        "Processing upload {} ({})",
        upload.file_name,
        format_size(upload.bytes.len() as u64)
    );
    let result = state
        .pipeline()
        .build_in_memory(&pdf_path, &state.settings.output_dir, &no_progress)
        .await;

    let (index, summary) = match result {
        Ok(built) => built,
        Err(e) => {
            warn!("Processing {} failed: {}", upload.file_name, e);
            return error_page(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Processing Failed",
                &e.to_string(),
            );
        }
    };

    let engine = match state.engine_for(index) {
        Ok(engine) => engine,
        Err(e) => return error_page(qa_error_status(&e), "Processing Failed", &e.to_string()),
    };

    state
        .session
        .write()
        .await
        .load(upload.file_name, engine, processed_notice(&summary));

    Redirect::to("/").into_response()
}

/// Load the persisted index from the configured index directory.
pub async fn load_index(State(state): State<AppState>) -> Response {
    let index_dir = state.settings.index_dir.clone();
    let loaded = match tokio::task::spawn_blocking(move || VectorIndex::load(&index_dir)).await {
        Ok(result) => result.map_err(QaError::from),
        Err(e) => {
            return error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Load Failed",
                &e.to_string(),
            )
        }
    };

    let engine = match loaded.and_then(|index| state.engine_for(index)) {
        Ok(engine) => engine,
        Err(e) => return error_page(qa_error_status(&e), "Load Failed", &e.to_string()),
    };

    let name = engine.index().meta.source.file_name.clone();
    let notice = format!(
        "Loaded {} ({} passages from {} pages)",
        name,
        engine.index().len(),
        engine.index().meta.source.page_count
    );
    state.session.write().await.load(name, engine, notice);

    Redirect::to("/").into_response()
}
