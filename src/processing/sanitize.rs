//! PII redaction and request-field normalization.

use crate::generation::{GenerationClient, GenerationRequest};
use std::sync::Arc;

use super::types::{SanitizationError, ValidationError};

/// Redaction runs fully deterministic.
pub const SANITIZER_TEMPERATURE: f32 = 0.0;

const MAX_SESSION_ID_LEN: usize = 128;

/// Redacts emails, phone numbers and API keys from chunk text through a language model.
#[derive(Clone)]
pub struct PiiSanitizer {
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl PiiSanitizer {
    /// Build a sanitizer that prompts `model` through `client`.
    pub fn new(client: Arc<dyn GenerationClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Return the redacted text. An empty model answer is an error, never a pass-through.
    pub async fn sanitize(&self, text: &str) -> Result<String, SanitizationError> {
        let sanitized = self
            .client
            .generate(GenerationRequest {
                model: self.model.clone(),
                prompt: redaction_prompt(text),
                temperature: SANITIZER_TEMPERATURE,
            })
            .await?;

        if sanitized.trim().is_empty() {
            return Err(SanitizationError::EmptyResponse);
        }
        Ok(sanitized)
    }
}

fn redaction_prompt(text: &str) -> String {
    format!(
        "You are a PII sanitization agent. Redact Personally Identifiable Information (PII) \
from the text (emails, phone numbers, API keys). Replace with [REDACTED EMAIL], [REDACTED PHONE], \
or [REDACTED KEY]. Return ONLY the sanitized text with no conversational filler.\n\n\
Text to sanitize:\n{text}"
    )
}

/// Validate a caller-supplied session identifier.
///
/// Session ids are opaque: any text up to 128 characters is accepted once surrounding
/// whitespace is removed. Control characters are rejected; quotes are escaped later by the
/// metadata filter builder.
pub fn sanitize_session_id(value: Option<String>) -> Result<String, ValidationError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("session_id"));
    }
    if trimmed.chars().count() > MAX_SESSION_ID_LEN || trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidSessionId {
            max_chars: MAX_SESSION_ID_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Require a non-blank chat message.
pub fn sanitize_message(value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(message) if !message.trim().is_empty() => Ok(message),
        _ => Err(ValidationError::MissingField("message")),
    }
}
