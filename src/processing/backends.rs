//! Per-request construction of backend clients.

use crate::config::Config;
use crate::embedding::{EmbeddingClient, GeminiEmbeddingClient};
use crate::generation::{GeminiGenerationClient, GenerationClient};
use crate::vector::{UpstashClient, VectorStore};
use std::sync::Arc;

use super::types::ProcessingError;

/// Client handles used by one request.
#[derive(Clone)]
pub struct Backends {
    /// Embedding provider.
    pub embedder: Arc<dyn EmbeddingClient>,
    /// Text generation provider for redaction and answers.
    pub generator: Arc<dyn GenerationClient>,
    /// Vector index.
    pub store: Arc<dyn VectorStore>,
}

/// Builds a fresh set of [`Backends`] for each operation.
pub trait BackendFactory: Send + Sync {
    /// Construct clients; failures are terminal for the request.
    fn connect(&self) -> Result<Backends, ProcessingError>;
}

/// Factory creating Gemini and Upstash clients from configuration.
pub struct EnvBackendFactory {
    config: Config,
}

impl EnvBackendFactory {
    /// Capture the configuration used to build clients.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl BackendFactory for EnvBackendFactory {
    fn connect(&self) -> Result<Backends, ProcessingError> {
        let embedder = GeminiEmbeddingClient::from_config(&self.config)
            .map_err(|error| ProcessingError::Backend(error.to_string()))?;
        let generator = GeminiGenerationClient::from_config(&self.config)
            .map_err(|error| ProcessingError::Backend(error.to_string()))?;
        let store = UpstashClient::from_config(&self.config)
            .map_err(|error| ProcessingError::Backend(error.to_string()))?;

        Ok(Backends {
            embedder: Arc::new(embedder),
            generator: Arc::new(generator),
            store: Arc::new(store),
        })
    }
}
