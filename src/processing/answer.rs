//! Grounded answer streaming.

use crate::generation::{GenerationClient, GenerationRequest};
use crate::vector::{QueryResult, extract_chunk_text};
use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;

/// Phrase the model is told to use when the context does not contain the answer.
pub const FALLBACK_ANSWER: &str = "I cannot answer this based on the provided document.";

/// Sampling temperature for answers.
pub const ANSWER_TEMPERATURE: f32 = 0.2;

/// Characters of chunk text kept in a citation snippet.
pub const SNIPPET_CHARS: usize = 100;

const DONE_SENTINEL: &str = "[DONE]";

/// One event of the chat answer stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Snippets of the retrieved chunks; always the first event.
    Citations {
        /// Snippet per retrieved chunk, in score order.
        citations: Vec<String>,
    },
    /// Incremental answer text.
    Text {
        /// Fragment as produced by the model.
        text: String,
    },
    /// The model stream failed; no further text follows.
    Error {
        /// Upstream failure description.
        message: String,
    },
    /// Terminal marker.
    Done,
}

impl ChatEvent {
    /// Payload for the SSE `data:` field.
    pub fn to_sse_data(&self) -> String {
        match self {
            Self::Done => DONE_SENTINEL.to_string(),
            event => serde_json::to_string(event).unwrap_or_else(|error| {
                tracing::error!(error = %error, "Failed to encode chat event");
                String::from("{\"type\":\"error\",\"message\":\"event encoding failed\"}")
            }),
        }
    }
}

/// Ordered stream of chat events for one question.
pub type AnswerStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Chunk texts retrieved for a question and the snippets shown to the user.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Full chunk texts, highest score first.
    pub chunks: Vec<String>,
    /// Snippet per chunk, same order.
    pub citations: Vec<String>,
}

/// Pull chunk text out of query matches; matches without text are skipped.
pub fn collect_context(matches: Vec<QueryResult>) -> RetrievedContext {
    let mut context = RetrievedContext::default();
    for hit in matches {
        let Some(text) = hit.metadata.as_ref().and_then(extract_chunk_text) else {
            tracing::debug!(id = %hit.id, "Match without chunk text");
            continue;
        };
        context.citations.push(citation_snippet(text));
        context.chunks.push(text.to_string());
    }
    context
}

/// First [`SNIPPET_CHARS`] characters of `text`, with an ellipsis when truncated.
pub fn citation_snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Prompt that restricts the model to the retrieved context.
pub fn grounding_prompt(chunks: &[String], question: &str) -> String {
    format!(
        "You are a helpful AI assistant. Answer the user's question based ONLY on the provided \
context retrieved from a document.\nIf the answer is not in the context, say \"{FALLBACK_ANSWER}\"\
\n\nContext:\n{}\n\nQuestion:\n{question}",
        chunks.join("\n\n")
    )
}

/// Stream citations, then the model's answer, then the terminal marker.
///
/// A failure to open the model stream or a mid-stream error becomes a single
/// [`ChatEvent::Error`] before [`ChatEvent::Done`].
pub fn answer_events(
    generator: Arc<dyn GenerationClient>,
    model: String,
    context: RetrievedContext,
    question: String,
) -> AnswerStream {
    Box::pin(stream! {
        let RetrievedContext { chunks, citations } = context;
        yield ChatEvent::Citations { citations };

        let request = GenerationRequest {
            model,
            prompt: grounding_prompt(&chunks, &question),
            temperature: ANSWER_TEMPERATURE,
        };

        match generator.stream(request).await {
            Ok(mut fragments) => {
                while let Some(fragment) = fragments.next().await {
                    match fragment {
                        Ok(text) => yield ChatEvent::Text { text },
                        Err(error) => {
                            tracing::warn!(error = %error, "Answer stream failed");
                            yield ChatEvent::Error { message: error.to_string() };
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to open answer stream");
                yield ChatEvent::Error { message: error.to_string() };
            }
        }

        yield ChatEvent::Done;
    })
}
