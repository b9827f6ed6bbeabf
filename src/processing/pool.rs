//! Bounded worker pool that sanitizes and embeds chunks.
//!
//! Chunks are queued on a channel shared by a fixed number of tasks. Each task pulls the next
//! chunk, runs it through the [`ChunkProcessor`], and reports a [`WorkerResult`] tagged with the
//! chunk index. Joining every task is the barrier: results are only read once all workers exit.

use crate::embedding::EmbeddingClient;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::Instrument;

use super::sanitize::PiiSanitizer;
use super::types::ChunkError;

/// A sanitized chunk together with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Redacted chunk text, the only text ever persisted.
    pub sanitized_text: String,
    /// Embedding of the redacted text.
    pub vector: Vec<f32>,
}

/// Outcome for one chunk.
#[derive(Debug)]
pub struct WorkerResult {
    /// Position of the chunk in the document.
    pub chunk_index: usize,
    /// Processed chunk or the reason it was dropped.
    pub outcome: Result<EmbeddedChunk, ChunkError>,
}

/// Per-chunk pipeline: redact, then embed the redacted text.
pub struct ChunkProcessor {
    sanitizer: PiiSanitizer,
    embedder: Arc<dyn EmbeddingClient>,
}

impl ChunkProcessor {
    /// Combine a sanitizer and an embedder.
    pub fn new(sanitizer: PiiSanitizer, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            sanitizer,
            embedder,
        }
    }

    /// Sanitize and embed one chunk.
    pub async fn process(&self, text: &str) -> Result<EmbeddedChunk, ChunkError> {
        let sanitized_text = self.sanitizer.sanitize(text).await?;
        let vector = self.embedder.embed(&sanitized_text).await?;
        Ok(EmbeddedChunk {
            sanitized_text,
            vector,
        })
    }
}

/// Run every chunk through `processor` on at most `workers` concurrent tasks.
///
/// Results come back sorted by chunk index, one per input chunk unless a task panicked.
/// Dropping the returned future aborts all in-flight tasks.
pub async fn process_chunks(
    chunks: Vec<String>,
    processor: Arc<ChunkProcessor>,
    workers: usize,
) -> Vec<WorkerResult> {
    let total = chunks.len();
    if total == 0 {
        return Vec::new();
    }

    let (job_tx, job_rx) = mpsc::channel::<(usize, String)>(total);
    for job in chunks.into_iter().enumerate() {
        // Capacity equals the job count, so this never waits.
        if job_tx.send(job).await.is_err() {
            break;
        }
    }
    drop(job_tx);

    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<WorkerResult>();
    let mut tasks = JoinSet::new();

    for worker in 0..workers.clamp(1, total) {
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let processor = Arc::clone(&processor);
        tasks.spawn(async move {
            loop {
                let next = job_rx.lock().await.recv().await;
                let Some((chunk_index, text)) = next else {
                    break;
                };
                let outcome = processor.process(&text).await;
                if let Err(error) = &outcome {
                    tracing::warn!(worker, chunk_index, error = %error, "Dropping chunk");
                }
                if result_tx.send(WorkerResult { chunk_index, outcome }).is_err() {
                    break;
                }
            }
        }
        .in_current_span());
    }
    drop(result_tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(error) = joined {
            tracing::error!(error = %error, "Ingestion worker terminated abnormally");
        }
    }

    let mut results = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        results.push(result);
    }
    results.sort_by_key(|result| result.chunk_index);
    results
}
