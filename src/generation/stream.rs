//! Server-sent event decoding for streaming completions.

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures_util::{StreamExt, pin_mut};

use super::{GenerateContentResponse, GenerationClientError, TextStream};

/// Decode an `alt=sse` response body into non-empty text fragments.
///
/// The stream ends after the first transport or payload error.
pub(super) fn text_fragments(response: reqwest::Response) -> TextStream {
    Box::pin(try_stream! {
        let events = response.bytes_stream().eventsource();
        pin_mut!(events);

        while let Some(event) = events.next().await {
            let event = event.map_err(|error| GenerationClientError::Stream(error.to_string()))?;
            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }

            let mut chunk: GenerateContentResponse = serde_json::from_str(data).map_err(|error| {
                GenerationClientError::InvalidResponse(format!("undecodable stream event: {error}"))
            })?;
            if let Some(error) = chunk.error.take() {
                Err(GenerationClientError::Stream(error.message))?;
            }

            let text = chunk.text();
            if !text.is_empty() {
                yield text;
            }
        }
    })
}
