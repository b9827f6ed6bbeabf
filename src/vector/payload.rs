//! Helpers for constructing records and reading stored metadata.

use crate::vector::types::{RecordMetadata, VectorRecord};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata key holding the sanitized chunk text.
pub const CHUNK_TEXT_KEY: &str = "chunk_text";

/// Assemble a record with a fresh identifier for the given session.
pub fn build_record(
    session_id: &str,
    chunk_text: String,
    vector: Vec<f32>,
    timestamp: i64,
) -> VectorRecord {
    VectorRecord {
        id: generate_record_id(),
        vector,
        metadata: RecordMetadata {
            session_id: session_id.to_string(),
            chunk_text,
            timestamp,
        },
    }
}

/// Read the chunk text out of a query match's metadata, if present.
pub fn extract_chunk_text(metadata: &Map<String, Value>) -> Option<&str> {
    metadata.get(CHUNK_TEXT_KEY).and_then(Value::as_str)
}

pub(crate) fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn current_unix_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
