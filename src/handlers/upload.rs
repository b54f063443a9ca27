// src/handlers/upload.rs

use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    pipeline::{extractor, segmenter},
    utils::files::{is_pdf, sanitize_filename, timestamped_name},
};

/// Stages an uploaded PDF under the upload directory.
///
/// The stored path is what `generate-exam` expects back. The returned
/// question count is a preview only: a PDF that cannot be read still gets
/// stored, with a count of 0.
pub async fn upload_pdf(
    State(config): State<Config>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| AppError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() + chunk.len() > config.max_upload_bytes {
                return Err(AppError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    config.max_upload_bytes / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((filename, bytes));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }
    if !is_pdf(&filename) {
        return Err(AppError::BadRequest("Invalid file type".to_string()));
    }
    let safe_name = sanitize_filename(&filename)
        .filter(|name| is_pdf(name))
        .ok_or_else(|| AppError::BadRequest("Invalid file type".to_string()))?;

    let unique_name = timestamped_name(&safe_name);
    let file_path = Path::new(&config.upload_dir).join(&unique_name);

    tokio::fs::write(&file_path, &bytes).await.map_err(|e| {
        tracing::error!("Failed to store upload {}: {:?}", file_path.display(), e);
        AppError::InternalServerError(e.to_string())
    })?;

    let num_preguntas = match extractor::extract_text_async(
        file_path.clone(),
        config.pipeline.max_pages,
    )
    .await
    {
        Ok(text) => segmenter::segment(&text, config.pipeline.max_candidate_chars).len(),
        Err(e) => {
            tracing::warn!("Could not preview {}: {}", file_path.display(), e);
            0
        }
    };

    tracing::info!(file = %unique_name, bytes = bytes.len(), num_preguntas, "PDF uploaded");

    Ok(Json(json!({
        "success": true,
        "filename": unique_name,
        "num_preguntas": num_preguntas,
        "file_path": file_path.to_string_lossy()
    })))
}
