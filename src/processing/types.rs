//! Core data types and error definitions for the processing pipeline.

use crate::{embedding::EmbeddingClientError, generation::GenerationClientError, vector::StoreError};
use thiserror::Error;

/// Errors raised while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Bytes are not a parseable PDF.
    #[error("Error parsing PDF: {0}")]
    Unreadable(String),
    /// Document parsed but carries no text layer.
    #[error("No text found in PDF")]
    NoText,
}

/// Errors produced by invalid chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Windows must contain at least one word.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would stall the window.
    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Configured chunk size in words.
        chunk_size: usize,
        /// Configured overlap in words.
        overlap: usize,
    },
}

/// Errors raised by PII redaction.
#[derive(Debug, Error)]
pub enum SanitizationError {
    /// Model call failed.
    #[error("PII sanitization failed: {0}")]
    Model(#[from] GenerationClientError),
    /// Model answered without any text.
    #[error("PII sanitization returned no text")]
    EmptyResponse,
}

/// Errors for missing or malformed request fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("{0} required")]
    MissingField(&'static str),
    /// Session identifier is too long or contains control characters.
    #[error("invalid session_id: must be at most {max_chars} characters without control characters")]
    InvalidSessionId {
        /// Maximum accepted length in characters.
        max_chars: usize,
    },
    /// Uploaded file exceeds the size cap.
    #[error("file exceeds the {limit} byte upload limit")]
    FileTooLarge {
        /// Maximum accepted size in bytes.
        limit: usize,
    },
}

/// Reason a single chunk was dropped during ingestion.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Redaction failed; the raw text is never indexed.
    #[error(transparent)]
    Sanitization(#[from] SanitizationError),
    /// Embedding failed for the sanitized text.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingClientError),
}

/// Errors emitted by the processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Request fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Document could not be turned into text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Chunking parameters were invalid.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Query embedding failed.
    #[error("Error generating embedding: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store rejected the request.
    #[error("Vector store request failed: {0}")]
    Store(#[from] StoreError),
    /// Every chunk of the document failed sanitization or embedding.
    #[error("No chunks could be indexed ({failed} failed)")]
    NothingIndexed {
        /// Number of chunks that were dropped.
        failed: usize,
    },
    /// Backend clients could not be constructed for this request.
    #[error("Failed to initialize backend clients: {0}")]
    Backend(String),
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Chunks upserted into the vector store.
    pub chunks_indexed: usize,
    /// Chunks dropped after a sanitization or embedding failure.
    pub chunks_failed: usize,
}
