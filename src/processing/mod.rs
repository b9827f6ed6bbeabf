//! Document processing pipeline: extraction, chunking, redaction, embedding and answering.

pub mod answer;
pub mod backends;
pub mod chunking;
pub mod extract;
pub mod pool;
pub mod sanitize;
mod service;
pub mod types;

pub use answer::{AnswerStream, ChatEvent, FALLBACK_ANSWER};
pub use backends::{BackendFactory, Backends, EnvBackendFactory};
pub use sanitize::{sanitize_message, sanitize_session_id};
pub use service::{PipelineSettings, ProcessingApi, ProcessingService};
pub use types::{
    ChunkError, ChunkingError, ExtractionError, IngestOutcome, ProcessingError,
    SanitizationError, ValidationError,
};
