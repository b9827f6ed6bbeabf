//! Text generation through a hosted language model.
//!
//! Two call shapes are supported: a one-shot completion used for PII redaction, and a
//! token-streaming completion used for grounded answers. The Gemini-backed client issues HTTP
//! requests directly against the REST API, mirroring the embedding adapter.

mod stream;

use crate::config::Config;
use async_trait::async_trait;
use futures_core::Stream;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::pin::Pin;
use thiserror::Error;

/// Incremental text fragments produced by a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GenerationClientError>> + Send>>;

/// Errors surfaced while generating text.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Provider could not be reached or the client could not be built.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Streaming connection broke or carried an error payload.
    #[error("Generation stream failed: {0}")]
    Stream(String),
}

/// Request payload passed to the generation provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Fully assembled prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Interface implemented by text generation providers.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationClientError>;

    /// Open a streaming completion and return its text fragments as they arrive.
    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, GenerationClientError>;
}

/// Gemini `generateContent` / `streamGenerateContent` client.
pub struct GeminiGenerationClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiGenerationClient {
    /// Construct a client for the given API base URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GenerationClientError> {
        let http = Client::builder()
            .user_agent("pdfchat/generate")
            .build()
            .map_err(|error| GenerationClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Construct a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, GenerationClientError> {
        Self::new(config.gemini_base_url.clone(), config.gemini_api_key.clone())
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send(
        &self,
        url: String,
        request: &GenerationRequest,
    ) -> Result<reqwest::Response, GenerationClientError> {
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|error| {
                GenerationClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GenerationClientError::ProviderUnavailable(format!(
                "model endpoint {url} returned 404"
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "model returned {status}: {body}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for GeminiGenerationClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationClientError> {
        let url = self.endpoint(&request.model, "generateContent");
        let response = self.send(url, &request).await?;
        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        if let Some(error) = body.error {
            return Err(GenerationClientError::GenerationFailed(error.message));
        }
        if body.candidates.is_empty() {
            return Err(GenerationClientError::InvalidResponse(
                "response contained no candidates".into(),
            ));
        }
        Ok(body.text())
    }

    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, GenerationClientError> {
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&request.model, "streamGenerateContent")
        );
        let response = self.send(url, &request).await?;
        tracing::debug!(model = %request.model, "Generation stream opened");
        Ok(stream::text_fragments(response))
    }
}

fn request_body(request: &GenerationRequest) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": request.prompt }] }
        ],
        "generationConfig": {
            "temperature": request.temperature,
        }
    })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub(crate) message: String,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}
