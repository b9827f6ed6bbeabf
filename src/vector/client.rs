//! HTTP client wrapper for the hosted vector index.

use crate::config::Config;
use crate::vector::{
    filters::session_filter,
    types::{QueryRequest, QueryResponse, QueryResult, StoreError, VectorRecord},
};
use async_trait::async_trait;
use reqwest::{Client, Method};

/// Upper bound on ids collected by a single session wipe.
pub const WIPE_QUERY_LIMIT: usize = 1000;

/// Operations the pipeline needs from a vector index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records, keyed by id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), StoreError>;

    /// Return matches ordered by descending similarity score.
    async fn query(&self, request: QueryRequest) -> Result<Vec<QueryResult>, StoreError>;

    /// Delete every record tagged with `session_id`, returning how many ids were removed.
    async fn delete_by_session(&self, session_id: &str) -> Result<usize, StoreError>;
}

/// Lightweight REST client for an Upstash-compatible vector index.
pub struct UpstashClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) token: String,
    pub(crate) dimension: usize,
}

impl UpstashClient {
    /// Construct a client for the given endpoint, bearer token, and index dimensionality.
    pub fn new(base_url: &str, token: &str, dimension: usize) -> Result<Self, StoreError> {
        let client = Client::builder().user_agent("pdfchat/0.1").build()?;
        let base_url = normalize_base_url(base_url).map_err(StoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_token = !token.is_empty(),
            dimension,
            "Initialized vector store HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
            dimension,
        })
    }

    /// Construct a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(
            &config.vector_rest_url,
            &config.vector_rest_token,
            config.embedding_dimension,
        )
    }

    async fn delete_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, "delete")
            .json(ids)
            .send()
            .await?;

        check_status(response, "delete").await?;
        tracing::debug!(ids = ids.len(), "Records deleted");
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if !self.token.is_empty() {
            req = req.bearer_auth(&self.token);
        }
        req
    }
}

#[async_trait]
impl VectorStore for UpstashClient {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let response = self
            .request(Method::POST, "upsert")
            .json(&records)
            .send()
            .await?;

        check_status(response, "upsert").await?;
        tracing::debug!(records = count, "Records upserted");
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<QueryResult>, StoreError> {
        let response = self
            .request(Method::POST, "query")
            .json(&request)
            .send()
            .await?;

        let QueryResponse { mut result } = check_status(response, "query").await?.json().await?;
        result.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(result)
    }

    async fn delete_by_session(&self, session_id: &str) -> Result<usize, StoreError> {
        // No native delete-by-metadata: collect ids under the session filter, then delete by id.
        let matches = self
            .query(QueryRequest {
                vector: vec![0.0; self.dimension],
                top_k: WIPE_QUERY_LIMIT,
                include_metadata: false,
                filter: Some(session_filter(session_id)),
            })
            .await?;

        if matches.is_empty() {
            tracing::debug!(session_id, "No records to delete");
            return Ok(0);
        }

        let ids: Vec<String> = matches.into_iter().map(|hit| hit.id).collect();
        self.delete_ids(&ids).await?;
        Ok(ids.len())
    }
}

/// Pass successful responses through; turn anything else into [`StoreError::UnexpectedStatus`].
async fn check_status(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = StoreError::UnexpectedStatus { status, body };
    tracing::error!(operation, error = %error, "Vector store request failed");
    Err(error)
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
