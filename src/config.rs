use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
const DEFAULT_SANITIZER_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_CHUNK_SIZE: usize = 300;
const DEFAULT_CHUNK_OVERLAP: usize = 50;
const DEFAULT_INGEST_WORKERS: usize = 5;
const DEFAULT_RETRIEVAL_TOP_K: usize = 3;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the PDF chat service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the Gemini language and embedding models.
    pub gemini_api_key: String,
    /// Base URL of the Gemini REST API (stable `v1` surface by default).
    pub gemini_base_url: String,
    /// Base URL of the hosted vector index REST endpoint.
    pub vector_rest_url: String,
    /// Bearer token for the hosted vector index.
    pub vector_rest_token: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Model used for PII redaction.
    pub sanitizer_model: String,
    /// Model used to stream grounded answers.
    pub chat_model: String,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of concurrent ingestion workers.
    pub ingest_workers: usize,
    /// Matches retrieved per question.
    pub retrieval_top_k: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Log file to append to instead of `logs/pdfchat.log`.
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            vector_rest_url: load_env("UPSTASH_VECTOR_REST_URL")?,
            vector_rest_token: load_env("UPSTASH_VECTOR_REST_TOKEN")?,
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: parse_or("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
            sanitizer_model: load_env_optional("SANITIZER_MODEL")
                .unwrap_or_else(|| DEFAULT_SANITIZER_MODEL.to_string()),
            chat_model: load_env_optional("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            chunk_size: parse_or("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_or("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            ingest_workers: parse_or("INGEST_WORKERS", DEFAULT_INGEST_WORKERS)?,
            retrieval_top_k: parse_or("RETRIEVAL_TOP_K", DEFAULT_RETRIEVAL_TOP_K)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            log_file: load_env_optional("PDFCHAT_LOG_FILE"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue("CHUNK_OVERLAP".into()));
        }
        if self.ingest_workers == 0 {
            return Err(ConfigError::InvalidValue("INGEST_WORKERS".into()));
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::InvalidValue("RETRIEVAL_TOP_K".into()));
        }
        Ok(())
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        vector_url = %config.vector_rest_url,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        chat_model = %config.chat_model,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        ingest_workers = config.ingest_workers,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
