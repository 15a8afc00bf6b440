//! services/app/src/ingest.rs
//!
//! Turns an uploaded file into lesson content and saves it as a notebook.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use bytes::Bytes;
use dream_path_core::{ContentNormalizer, Notebook, SourceKind};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub file_name: String,
    pub content: String,
    /// The notebook the content was saved to, when saving succeeded.
    pub notebook: Option<Notebook>,
}

/// Normalizes raw file bytes off the async runtime; PDF parsing is CPU-bound.
pub async fn normalize_bytes(
    normalizer: Arc<ContentNormalizer>,
    bytes: Bytes,
    kind: SourceKind,
) -> AppResult<String> {
    let text = tokio::task::spawn_blocking(move || normalizer.normalize(&bytes, kind))
        .await
        .map_err(|e| AppError::Internal(format!("File decoding task failed: {}", e)))??;
    Ok(text)
}

/// Reads `path`, extracts its text and auto-saves it as a notebook.
///
/// A failed save is logged and does not fail the ingestion.
pub async fn ingest_file(
    state: &AppState,
    path: &Path,
    owner: Option<Uuid>,
) -> AppResult<IngestedFile> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let kind = SourceKind::from_file_name(&file_name);

    let bytes = Bytes::from(tokio::fs::read(path).await?);
    info!(file = %file_name, size = bytes.len(), ?kind, "Ingesting file");
    let content = normalize_bytes(state.normalizer.clone(), bytes, kind).await?;

    let notebook = match state.notebooks.save_upload(owner, &file_name, &content).await {
        Ok(notebook) => notebook,
        Err(e) => {
            warn!("Failed to save notebook for {}: {}", file_name, e);
            None
        }
    };

    Ok(IngestedFile {
        file_name,
        content,
        notebook,
    })
}
