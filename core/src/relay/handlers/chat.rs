//! Non-streaming chat relay
//! Handles POST /api/chat and the legacy POST /

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::error::RelayError;
use crate::relay::handlers::new_trace_id;
use crate::relay::mappers::messages::{extract_messages, normalize, to_input_items};
use crate::relay::mappers::parse_json_body;
use crate::relay::server::AppState;

/// Handle POST /api/chat
pub async fn handle_chat(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    if !state.config.completion.has_api_key() {
        return Err(RelayError::Config("OPENAI_API_KEY not configured".to_string()));
    }

    let trace_id = new_trace_id();
    let messages = extract_messages(&parse_json_body(&body));
    tracing::info!("[{}] Chat request | Messages: {}", trace_id, messages.len());

    let input = to_input_items(&normalize(&state.config.completion.system_prompt, messages));
    let reply = state.upstream.call_with_retry(&input, &state.retry).await;

    tracing::info!("[{}] Chat reply | Status: {}", trace_id, reply.status);
    Ok(reply.into_response())
}
