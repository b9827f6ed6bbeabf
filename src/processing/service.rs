//! Processing service coordinating extraction, chunking, redaction, embedding and retrieval.

use crate::{
    config::{Config, get_config},
    logging::session_span,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        answer::{AnswerStream, answer_events, collect_context},
        backends::{BackendFactory, EnvBackendFactory},
        chunking::chunk_words,
        extract::extract_text,
        pool::{ChunkProcessor, process_chunks},
        sanitize::PiiSanitizer,
        types::{ExtractionError, IngestOutcome, ProcessingError},
    },
    vector::{
        QueryRequest, VectorRecord, build_record, payload::current_unix_timestamp, session_filter,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

/// Tunables for the ingestion and answer pipelines.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Concurrent ingestion workers.
    pub ingest_workers: usize,
    /// Matches retrieved per question.
    pub retrieval_top_k: usize,
    /// Model used for PII redaction.
    pub sanitizer_model: String,
    /// Model used for answers.
    pub chat_model: String,
}

impl PipelineSettings {
    /// Extract pipeline settings from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            ingest_workers: config.ingest_workers,
            retrieval_top_k: config.retrieval_top_k,
            sanitizer_model: config.sanitizer_model.clone(),
            chat_model: config.chat_model.clone(),
        }
    }
}

/// Runs the ingestion, answer and wipe flows for chat sessions.
///
/// The service holds no backend connections itself. Every operation asks its
/// [`BackendFactory`] for fresh clients and drops them when the operation ends; the only state
/// shared across requests is the metrics registry.
pub struct ProcessingService {
    backends: Box<dyn BackendFactory>,
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the processing pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Extract, chunk, redact, embed and index a PDF for `session_id`.
    async fn ingest_document(
        &self,
        session_id: &str,
        document: Vec<u8>,
    ) -> Result<IngestOutcome, ProcessingError>;

    /// Retrieve context for `question` and stream a grounded answer.
    async fn answer(
        &self,
        session_id: &str,
        question: String,
    ) -> Result<AnswerStream, ProcessingError>;

    /// Delete every chunk stored for `session_id`.
    async fn wipe_session(&self, session_id: &str) -> Result<usize, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a service from the global configuration.
    pub fn new() -> Self {
        Self::from_config(get_config())
    }

    /// Build a service whose backends are the Gemini and Upstash clients described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_backends(
            EnvBackendFactory::new(config.clone()),
            PipelineSettings::from_config(config),
        )
    }

    /// Build a service over a custom backend factory.
    pub fn with_backends(factory: impl BackendFactory + 'static, settings: PipelineSettings) -> Self {
        Self {
            backends: Box::new(factory),
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Extract text from a PDF and index it.
    pub async fn ingest_document(
        &self,
        session_id: &str,
        document: Vec<u8>,
    ) -> Result<IngestOutcome, ProcessingError> {
        async {
            tracing::info!(bytes = document.len(), "Processing document");
            let text = extract_text(document).await?;
            self.index_text(session_id, &text).await
        }
        .instrument(session_span("upload", session_id))
        .await
    }

    /// Chunk, redact, embed and upsert already extracted text.
    ///
    /// Chunks that fail redaction or embedding are dropped; the rest are written in one batch.
    pub async fn ingest_text(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<IngestOutcome, ProcessingError> {
        self.index_text(session_id, text)
            .instrument(session_span("upload", session_id))
            .await
    }

    async fn index_text(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<IngestOutcome, ProcessingError> {
        let chunks = chunk_words(text, self.settings.chunk_size, self.settings.chunk_overlap)?;
        if chunks.is_empty() {
            return Err(ExtractionError::NoText.into());
        }
        let total = chunks.len();
        tracing::debug!(
            chunks = total,
            workers = self.settings.ingest_workers,
            "Chunked document"
        );

        let backends = self.backends.connect()?;
        let processor = Arc::new(ChunkProcessor::new(
            PiiSanitizer::new(backends.generator.clone(), self.settings.sanitizer_model.clone()),
            backends.embedder.clone(),
        ));
        let results = process_chunks(chunks, processor, self.settings.ingest_workers).await;

        let timestamp = current_unix_timestamp();
        let records: Vec<VectorRecord> = results
            .into_iter()
            .filter_map(|result| result.outcome.ok())
            .map(|chunk| build_record(session_id, chunk.sanitized_text, chunk.vector, timestamp))
            .collect();
        let chunks_indexed = records.len();
        let chunks_failed = total - chunks_indexed;

        if records.is_empty() {
            self.metrics.record_document(0, chunks_failed as u64);
            tracing::warn!(failed = chunks_failed, "No chunks survived processing");
            return Err(ProcessingError::NothingIndexed {
                failed: chunks_failed,
            });
        }

        backends.store.upsert(records).await?;
        self.metrics
            .record_document(chunks_indexed as u64, chunks_failed as u64);
        tracing::info!(
            chunks = chunks_indexed,
            dropped = chunks_failed,
            "Document indexed"
        );

        Ok(IngestOutcome {
            chunks_indexed,
            chunks_failed,
        })
    }

    /// Embed the question, retrieve session context, and open the answer stream.
    ///
    /// Embedding and retrieval failures are returned before any event is produced.
    pub async fn answer(
        &self,
        session_id: &str,
        question: String,
    ) -> Result<AnswerStream, ProcessingError> {
        async {
            let backends = self.backends.connect()?;
            let vector = backends.embedder.embed(&question).await?;
            let matches = backends
                .store
                .query(QueryRequest {
                    vector,
                    top_k: self.settings.retrieval_top_k,
                    include_metadata: true,
                    filter: Some(session_filter(session_id)),
                })
                .await?;

            let context = collect_context(matches);
            tracing::debug!(matches = context.chunks.len(), "Retrieved context");
            self.metrics.record_question();

            Ok::<_, ProcessingError>(answer_events(
                backends.generator,
                self.settings.chat_model.clone(),
                context,
                question,
            ))
        }
        .instrument(session_span("chat", session_id))
        .await
    }

    /// Delete all records of a session. A session without records is a successful no-op.
    pub async fn wipe_session(&self, session_id: &str) -> Result<usize, ProcessingError> {
        async {
            let backends = self.backends.connect()?;
            let deleted = backends.store.delete_by_session(session_id).await?;
            self.metrics.record_wipe();
            tracing::info!(deleted, "Session wiped");
            Ok::<_, ProcessingError>(deleted)
        }
        .instrument(session_span("wipe", session_id))
        .await
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Default for ProcessingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn ingest_document(
        &self,
        session_id: &str,
        document: Vec<u8>,
    ) -> Result<IngestOutcome, ProcessingError> {
        ProcessingService::ingest_document(self, session_id, document).await
    }

    async fn answer(
        &self,
        session_id: &str,
        question: String,
    ) -> Result<AnswerStream, ProcessingError> {
        ProcessingService::answer(self, session_id, question).await
    }

    async fn wipe_session(&self, session_id: &str) -> Result<usize, ProcessingError> {
        ProcessingService::wipe_session(self, session_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}
