use std::path::Path;

use thiserror::Error;

/// File types accepted for recipient import. Contents are scanned for
/// phone-number-like tokens regardless of format.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx", "txt"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("unsupported file type {0:?} (expected csv, xls, xlsx or txt)")]
    UnsupportedType(String),
    #[error("could not read {path}: {message}")]
    Io { path: String, message: String },
}

/// Reads a recipient file as lossy UTF-8 text.
pub async fn read_recipient_file(path: &Path) -> Result<String, IngestError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IngestError::UnsupportedType(extension));
    }

    let bytes = tokio::fs::read(path).await.map_err(|err| IngestError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
