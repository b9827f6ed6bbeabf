//! Shared types used by the vector store client and helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid vector store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store responded with a non-success status code.
    #[error("Unexpected vector store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Metadata persisted next to every indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetadata {
    /// Session that owns the chunk; the only retrieval and deletion scope.
    pub session_id: String,
    /// Sanitized chunk text.
    pub chunk_text: String,
    /// Creation time in Unix seconds.
    pub timestamp: i64,
}

/// A vector ready for upsert.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    /// Unique record identifier.
    pub id: String,
    /// Embedding vector; its length must match the index dimensionality.
    pub vector: Vec<f32>,
    /// Metadata stored alongside the vector.
    pub metadata: RecordMetadata,
}

/// Parameters of a top-K similarity query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    /// Query embedding.
    pub vector: Vec<f32>,
    /// Maximum number of matches to return.
    #[serde(rename = "topK")]
    pub top_k: usize,
    /// Whether the store should include metadata in each match.
    #[serde(rename = "includeMetadata")]
    pub include_metadata: bool,
    /// Metadata filter expression, e.g. `session_id = 'abc'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// A single match returned by a similarity query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    /// Identifier of the matched record.
    pub id: String,
    /// Similarity score computed by the store.
    pub score: f32,
    /// Stored metadata, when requested and present.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) result: Vec<QueryResult>,
}
