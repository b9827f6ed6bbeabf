use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and answer activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_ingested: AtomicU64,
    chunks_indexed: AtomicU64,
    chunks_dropped: AtomicU64,
    sessions_wiped: AtomicU64,
    questions_answered: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ingested document with its indexed and dropped chunk counts.
    pub fn record_document(&self, indexed: u64, dropped: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(indexed, Ordering::Relaxed);
        self.chunks_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Record a completed session wipe.
    pub fn record_wipe(&self) {
        self.sessions_wiped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a question whose answer stream was opened.
    pub fn record_question(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            sessions_wiped: self.sessions_wiped.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that went through ingestion since startup.
    pub documents_ingested: u64,
    /// Chunks upserted into the vector store.
    pub chunks_indexed: u64,
    /// Chunks dropped after a sanitization or embedding failure.
    pub chunks_dropped: u64,
    /// Session wipes completed.
    pub sessions_wiped: u64,
    /// Questions that reached the answer stream.
    pub questions_answered: u64,
}
