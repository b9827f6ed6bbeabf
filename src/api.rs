//! HTTP surface for the PDF chat service.
//!
//! - `POST /api/upload` – Multipart `session_id` + `file`. Extracts, redacts, embeds and indexes
//!   the PDF; returns `{ "success": true, "chunks": n }`.
//! - `POST /api/chat` – JSON `{ "session_id", "message" }`. Streams server-sent events: a
//!   citations event, text fragments, an optional error event, then `[DONE]`.
//! - `POST /api/wipe` – JSON `{ "session_id" }`. Deletes every chunk of the session.
//! - `GET /metrics` – Pipeline counters.
//!
//! Every API route answers `OPTIONS` with an empty 200 and permissive CORS headers.

use crate::processing::{
    ExtractionError, ProcessingApi, ProcessingError, ValidationError, sanitize_message,
    sanitize_session_id,
};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, State,
        multipart::{Multipart, MultipartError},
    },
    http::{Method, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Largest accepted PDF, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart framing and the session field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const WIPE_MESSAGE: &str = "Nuclear Wipe Complete";

/// Build the HTTP router exposing the chat API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/upload",
            post(upload_document::<S>).options(preflight),
        )
        .route("/api/chat", post(chat::<S>).options(preflight))
        .route("/api/wipe", post(wipe_session::<S>).options(preflight))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Response body for `POST /api/upload`.
#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    chunks: usize,
}

/// Ingest an uploaded PDF into the caller's session.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: ProcessingApi,
{
    let mut session_id = None;
    let mut document = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("session_id") => session_id = Some(field.text().await?),
            Some("file") => {
                let bytes = field.bytes().await?;
                if bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(ValidationError::FileTooLarge {
                        limit: MAX_UPLOAD_BYTES,
                    }
                    .into());
                }
                document = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let session_id = sanitize_session_id(session_id)?;
    let document = document.ok_or(ValidationError::MissingField("file"))?;

    let outcome = service.ingest_document(&session_id, document).await?;
    tracing::info!(
        session_id,
        chunks = outcome.chunks_indexed,
        dropped = outcome.chunks_failed,
        "Upload completed"
    );
    Ok(Json(UploadResponse {
        success: true,
        chunks: outcome.chunks_indexed,
    }))
}

/// Request body for `POST /api/chat`.
#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Answer a question about the session's document as a server-sent event stream.
async fn chat<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError>
where
    S: ProcessingApi,
{
    let session_id = sanitize_session_id(request.session_id)?;
    let message = sanitize_message(request.message)?;

    let events = service.answer(&session_id, message).await?;
    let stream =
        events.map(|event| Ok::<_, Infallible>(Event::default().data(event.to_sse_data())));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Request body for `POST /api/wipe`.
#[derive(Deserialize)]
struct WipeRequest {
    #[serde(default)]
    session_id: Option<String>,
}

/// Response body for `POST /api/wipe`.
#[derive(Serialize)]
struct WipeResponse {
    success: bool,
    message: &'static str,
    deleted: usize,
}

/// Delete every chunk stored for the session.
async fn wipe_session<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<WipeRequest>,
) -> Result<Json<WipeResponse>, AppError>
where
    S: ProcessingApi,
{
    let session_id = sanitize_session_id(request.session_id)?;
    let deleted = service.wipe_session(&session_id).await?;
    Ok(Json(WipeResponse {
        success: true,
        message: WIPE_MESSAGE,
        deleted,
    }))
}

/// Return pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> impl IntoResponse
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

enum AppError {
    Processing(ProcessingError),
    Multipart(MultipartError),
}

fn status_for(error: &ProcessingError) -> StatusCode {
    match error {
        ProcessingError::Validation(ValidationError::FileTooLarge { .. }) => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        ProcessingError::Validation(_) => StatusCode::BAD_REQUEST,
        ProcessingError::Extraction(ExtractionError::NoText) => StatusCode::BAD_REQUEST,
        ProcessingError::Extraction(ExtractionError::Unreadable(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ProcessingError::NothingIndexed { .. } => StatusCode::BAD_GATEWAY,
        ProcessingError::Chunking(_)
        | ProcessingError::Embedding(_)
        | ProcessingError::Store(_)
        | ProcessingError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Multipart(error) => (error.status(), error.body_text()).into_response(),
            Self::Processing(error) => {
                let status = status_for(&error);
                if status.is_server_error() {
                    tracing::error!(error = %error, %status, "Request failed");
                } else {
                    tracing::debug!(error = %error, %status, "Request rejected");
                }
                let body = match error {
                    ProcessingError::NothingIndexed { .. } => {
                        json!({ "success": false, "chunks": 0, "error": error.to_string() })
                    }
                    _ => json!({ "success": false, "error": error.to_string() }),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<ValidationError> for AppError {
    fn from(inner: ValidationError) -> Self {
        Self::Processing(inner.into())
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_UPLOAD_BYTES, create_router};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        AnswerStream, ChatEvent, ExtractionError, IngestOutcome, ProcessingApi, ProcessingError,
    };
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use futures_util::stream;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdfchat-test-boundary";

    #[derive(Default)]
    struct StubProcessingService {
        uploads: Mutex<Vec<(String, usize)>>,
        questions: Mutex<Vec<(String, String)>>,
        wipes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcessingApi for StubProcessingService {
        async fn ingest_document(
            &self,
            session_id: &str,
            document: Vec<u8>,
        ) -> Result<IngestOutcome, ProcessingError> {
            if document.starts_with(b"bad") {
                return Err(ExtractionError::Unreadable("broken xref".into()).into());
            }
            if document.starts_with(b"none") {
                return Err(ProcessingError::NothingIndexed { failed: 3 });
            }
            self.uploads
                .lock()
                .await
                .push((session_id.to_string(), document.len()));
            Ok(IngestOutcome {
                chunks_indexed: 4,
                chunks_failed: 1,
            })
        }

        async fn answer(
            &self,
            session_id: &str,
            question: String,
        ) -> Result<AnswerStream, ProcessingError> {
            self.questions
                .lock()
                .await
                .push((session_id.to_string(), question));
            Ok(Box::pin(stream::iter(vec![
                ChatEvent::Citations {
                    citations: vec!["Snippet one".into()],
                },
                ChatEvent::Text {
                    text: "Hello".into(),
                },
                ChatEvent::Done,
            ])))
        }

        async fn wipe_session(&self, session_id: &str) -> Result<usize, ProcessingError> {
            self.wipes.lock().await.push(session_id.to_string());
            Ok(7)
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 2,
                ..MetricsSnapshot::default()
            }
        }
    }

    fn app() -> (Router, Arc<StubProcessingService>) {
        let service = Arc::new(StubProcessingService::default());
        (create_router(service.clone()), service)
    }

    fn multipart_body(session_id: Option<&str>, file: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(session_id) = session_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{session_id}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"doc.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn json_request(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn upload_route_ingests_multipart_file() {
        let (app, service) = app();
        let response = app
            .oneshot(upload_request(multipart_body(
                Some("sess-1"),
                Some(b"%PDF-1.4 body"),
            )))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "chunks": 4 })
        );
        let uploads = service.uploads.lock().await;
        assert_eq!(uploads.as_slice(), &[("sess-1".to_string(), 13)]);
    }

    #[tokio::test]
    async fn upload_without_session_is_rejected() {
        let (app, service) = app();
        let response = app
            .oneshot(upload_request(multipart_body(None, Some(b"%PDF"))))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let (app, service) = app();
        let file = vec![b'x'; MAX_UPLOAD_BYTES + 1];
        let response = app
            .oneshot(upload_request(multipart_body(Some("sess-1"), Some(&file))))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_pdf_maps_to_unprocessable() {
        let (app, _service) = app();
        let response = app
            .oneshot(upload_request(multipart_body(Some("s"), Some(b"bad bytes"))))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn nothing_indexed_reports_failure_body() {
        let (app, _service) = app();
        let response = app
            .oneshot(upload_request(multipart_body(Some("s"), Some(b"none"))))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["chunks"], 0);
    }

    #[tokio::test]
    async fn chat_streams_sse_frames_ending_with_done() {
        let (app, service) = app();
        let response = app
            .oneshot(json_request(
                "/api/chat",
                json!({ "session_id": "sess-1", "message": "What is it?" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body = String::from_utf8(bytes.to_vec()).expect("utf8");
        let frames: Vec<&str> = body
            .split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .collect();

        assert_eq!(frames.len(), 3);
        let citations: Value = serde_json::from_str(frames[0]).expect("citations json");
        assert_eq!(
            citations,
            json!({ "type": "citations", "citations": ["Snippet one"] })
        );
        let text: Value = serde_json::from_str(frames[1]).expect("text json");
        assert_eq!(text, json!({ "type": "text", "text": "Hello" }));
        assert_eq!(frames[2], "[DONE]");

        let questions = service.questions.lock().await;
        assert_eq!(
            questions.as_slice(),
            &[("sess-1".to_string(), "What is it?".to_string())]
        );
    }

    #[tokio::test]
    async fn chat_without_session_is_bad_request() {
        let (app, service) = app();
        let response = app
            .oneshot(json_request("/api/chat", json!({ "message": "hi" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.questions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn chat_with_blank_message_is_bad_request() {
        let (app, _service) = app();
        let response = app
            .oneshot(json_request(
                "/api/chat",
                json!({ "session_id": "s", "message": "  " }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wipe_route_reports_completion() {
        let (app, service) = app();
        let response = app
            .oneshot(json_request("/api/wipe", json!({ "session_id": "sess-9" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Nuclear Wipe Complete");
        assert_eq!(service.wipes.lock().await.as_slice(), &["sess-9".to_string()]);
    }

    #[tokio::test]
    async fn options_is_answered_with_cors_headers() {
        for uri in ["/api/upload", "/api/chat", "/api/wipe"] {
            let (app, _service) = app();
            let response = app
                .oneshot(
                    Request::builder()
                        .method(Method::OPTIONS)
                        .uri(uri)
                        .header(header::ORIGIN, "http://localhost:3000")
                        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("router response");

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(
                response
                    .headers()
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|value| value.to_str().ok()),
                Some("*")
            );
        }
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let (app, _service) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/chat")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let (app, _service) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["documents_ingested"], 2);
        assert_eq!(body["chunks_indexed"], 0);
    }
}
