use std::sync::Once;

use futures_util::StreamExt;
use pdfchat::{
    config,
    embedding::{EmbeddingClient, GeminiEmbeddingClient},
    processing::{ChatEvent, ProcessingService},
};

static INIT: Once = Once::new();

fn init_config_once() {
    INIT.call_once(config::init_config);
}

#[tokio::test]
#[ignore = "Requires a live Gemini API key"]
async fn live_gemini_embedding_has_configured_dimension() {
    init_config_once();
    let config = config::get_config();
    let client = GeminiEmbeddingClient::from_config(config).expect("embedding client");
    let vector = client
        .embed("pdfchat live embedding")
        .await
        .expect("failed to request embedding from provider");
    assert_eq!(
        vector.len(),
        config.embedding_dimension,
        "embedding dimension mismatch"
    );
}

#[tokio::test]
#[ignore = "Requires live Gemini and Upstash Vector credentials"]
async fn live_ingest_answer_and_wipe_roundtrip() {
    init_config_once();
    let service = ProcessingService::new();
    let session = format!("live-{}", uuid::Uuid::new_v4());

    let outcome = service
        .ingest_text(
            &session,
            "The Zephyr 3000 kettle carries a warranty of exactly two years from purchase.",
        )
        .await
        .expect("ingest");
    assert!(outcome.chunks_indexed >= 1);

    let events: Vec<ChatEvent> = service
        .answer(&session, "How long is the kettle warranty?".into())
        .await
        .expect("answer stream")
        .collect()
        .await;
    assert!(matches!(events.first(), Some(ChatEvent::Citations { .. })));
    assert_eq!(events.last(), Some(&ChatEvent::Done));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, ChatEvent::Error { .. })),
        "answer stream failed: {events:?}"
    );

    service.wipe_session(&session).await.expect("wipe");
}
