// src/pipeline/extractor.rs

use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF extraction task failed: {0}")]
    Task(String),
}

/// Concatenates the text of every page in page order, or of the first
/// `max_pages` pages when a cap is given. Pages are separated by a newline.
///
/// A page whose content cannot be decoded is skipped with a warning; only a
/// missing or unparseable file is an error.
pub fn extract_text(path: &Path, max_pages: Option<usize>) -> Result<String, ExtractionError> {
    if !path.is_file() {
        return Err(ExtractionError::NotFound(path.display().to_string()));
    }

    let doc = Document::load(path).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let page_numbers: Vec<u32> = doc
        .get_pages()
        .keys()
        .copied()
        .take(max_pages.unwrap_or(usize::MAX))
        .collect();

    let mut text = String::new();
    for page in page_numbers {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                if !page_text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Skipping unreadable PDF page");
            }
        }
    }

    Ok(text)
}

/// Runs [`extract_text`] on the blocking thread pool.
pub async fn extract_text_async(
    path: PathBuf,
    max_pages: Option<usize>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&path, max_pages))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}
