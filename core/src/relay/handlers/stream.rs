//! Streaming chat relay
//! Handles POST /api/chat-stream by passing upstream SSE bytes straight through

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use tokio::time::Duration;

use crate::relay::handlers::new_trace_id;
use crate::relay::mappers::messages::{extract_messages, normalize, to_input_items};
use crate::relay::mappers::parse_json_body;
use crate::relay::server::AppState;

type EventStream = BoxStream<'static, Result<Bytes, Infallible>>;

/// Encode a single terminal error event
pub fn error_event(marker: &str, message: &str) -> Bytes {
    let data = json!({ "error": marker, "message": message });
    Bytes::from(format!("event: error\ndata: {}\n\n", data))
}

fn single_event(event: Bytes) -> EventStream {
    stream::once(async move { Ok(event) }).boxed()
}

/// Forward upstream chunks unchanged. A read error ends the stream with
/// one error event; chunks already sent stand.
fn passthrough(response: reqwest::Response, trace_id: String) -> EventStream {
    let body = async_stream::stream! {
        let mut upstream = Box::pin(response.bytes_stream());
        let mut chunks = 0usize;
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    chunks += 1;
                    yield Ok::<Bytes, Infallible>(bytes);
                }
                Err(e) => {
                    tracing::warn!("[{}] Upstream stream interrupted after {} chunk(s): {}", trace_id, chunks, e);
                    yield Ok::<Bytes, Infallible>(error_event("stream_error", &e.to_string()));
                    break;
                }
            }
        }
        tracing::debug!("[{}] Stream closed after {} chunk(s)", trace_id, chunks);
    };
    body.boxed()
}

fn sse_response(events: EventStream) -> Response {
    sse_response_with_status(StatusCode::OK, events)
}

fn sse_response_with_status(status: StatusCode, events: EventStream) -> Response {
    let mut response = Response::new(Body::from_stream(events));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, header::HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", header::HeaderValue::from_static("no"));
    response
}

/// Handle POST /api/chat-stream
pub async fn handle_chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let completion = &state.config.completion;
    if !completion.has_api_key() {
        tracing::error!("Chat stream rejected: OPENAI_API_KEY not configured");
        return sse_response_with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            single_event(error_event("config_error", "OPENAI_API_KEY not configured")),
        );
    }

    let trace_id = new_trace_id();
    let messages = extract_messages(&parse_json_body(&body));
    tracing::info!("[{}] Chat stream request | Messages: {}", trace_id, messages.len());

    let input = to_input_items(&normalize(&completion.system_prompt, messages));
    let limit = Duration::from_secs(completion.stream_timeout_secs);

    let events = match state.upstream.open_stream(&input, limit).await {
        Ok(response) => passthrough(response, trace_id),
        Err(e) => {
            tracing::warn!("[{}] Chat stream failed to open: {}", trace_id, e);
            single_event(error_event(e.marker(), &e.to_string()))
        }
    };
    sse_response(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_event_is_one_sse_frame() {
        let event = error_event("upstream_error", "upstream returned 500: ");
        let text = std::str::from_utf8(&event).unwrap();

        assert!(text.starts_with("event: error\ndata: {"));
        assert!(text.ends_with("\n\n"));
        assert_eq!(text.matches("\n\n").count(), 1);

        let data = text.trim_end().strip_prefix("event: error\ndata: ").unwrap();
        let value: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(value["error"], "upstream_error");
    }

    #[tokio::test]
    async fn sse_response_sets_stream_headers() {
        let response = sse_response(single_event(Bytes::from_static(b"data: x\n\n")));

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"data: x\n\n");
    }
}
