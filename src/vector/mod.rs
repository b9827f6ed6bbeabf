//! Hosted vector index integration (Upstash Vector REST wire format).

pub mod client;
pub mod filters;
pub mod payload;
pub mod types;

pub use client::{UpstashClient, VectorStore};
pub use filters::session_filter;
pub use payload::{build_record, extract_chunk_text};
pub use types::{QueryRequest, QueryResult, RecordMetadata, StoreError, VectorRecord};
