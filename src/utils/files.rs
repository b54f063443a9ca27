// src/utils/files.rs

use std::path::{Path, PathBuf};

use chrono::Local;

/// True for names ending in `.pdf`, in any case.
pub fn is_pdf(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reduces a client supplied filename to a safe single path component.
///
/// Separators and whitespace become `_`, other characters outside
/// `[A-Za-z0-9._-]` are dropped, and leading or trailing dots and
/// underscores are stripped. `None` if nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let mapped: String = raw
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();

    let trimmed = mapped.trim_matches(['.', '_']);
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// `<YYYYmmdd_HHMMSS>_<name>` using local time.
pub fn timestamped_name(name: &str) -> String {
    format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), name)
}

/// Resolves `raw` and checks that it points at a file inside `dir`.
///
/// Returns `Ok(None)` when the file exists but lies outside `dir`.
pub async fn resolve_within(dir: &Path, raw: &str) -> std::io::Result<Option<PathBuf>> {
    let root = tokio::fs::canonicalize(dir).await?;
    let candidate = tokio::fs::canonicalize(raw).await?;

    if candidate.starts_with(&root) && candidate != root {
        Ok(Some(candidate))
    } else {
        Ok(None)
    }
}
