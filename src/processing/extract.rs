//! PDF text extraction.

use super::types::ExtractionError;

/// Extract the text layer of a PDF and collapse all whitespace runs to single spaces.
///
/// Parsing is CPU-bound and runs on the blocking pool; a parser panic on malformed input is
/// reported as [`ExtractionError::Unreadable`].
pub async fn extract_text(document: Vec<u8>) -> Result<String, ExtractionError> {
    let bytes = document.len();
    let raw = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&document).map_err(|error| error.to_string())
    })
    .await
    .map_err(|error| ExtractionError::Unreadable(format!("parser aborted: {error}")))?
    .map_err(ExtractionError::Unreadable)?;

    let text = normalize_whitespace(&raw);
    tracing::debug!(bytes, chars = text.len(), "Extracted PDF text");
    if text.is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(text)
}

/// Collapse newlines and whitespace runs into single spaces, trimming both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
