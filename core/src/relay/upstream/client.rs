//! Upstream client for calling the completion (responses) API

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tokio::time::{timeout, timeout_at, Duration, Instant};

use crate::config::CompletionConfig;
use crate::relay::mappers::messages::InputItem;
use crate::relay::retry::{AttemptOutcome, RetryPolicy};

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Request body for the responses endpoint
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub input: &'a [InputItem],
    pub max_output_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Raw upstream answer, relayed to the caller verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl UpstreamReply {
    /// Synthetic reply for an attempt that timed out or failed at the network layer
    pub fn timeout_or_network(details: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT.as_u16(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            body: json!({ "error": "timeout_or_network", "details": details.to_string() }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl AttemptOutcome for UpstreamReply {
    fn is_success(&self) -> bool {
        UpstreamReply::is_success(self)
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        if let Ok(value) = header::HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

/// Why a streaming call could not be opened
#[derive(Debug, thiserror::Error)]
pub enum StreamOpenError {
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Network(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl StreamOpenError {
    /// Machine-readable marker for the error event
    pub fn marker(&self) -> &'static str {
        match self {
            StreamOpenError::Timeout(_) | StreamOpenError::Network(_) => "timeout_or_network",
            StreamOpenError::Status { .. } => "upstream_error",
        }
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    completion: CompletionConfig,
}

impl UpstreamClient {
    pub fn new(http_client: Client, completion: CompletionConfig) -> Self {
        Self { http_client, completion }
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.completion.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, input: &'a [InputItem], stream: bool) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.completion.model,
            input,
            max_output_tokens: self.completion.max_output_tokens,
            temperature: self.completion.temperature,
            stream: stream.then_some(true),
        }
    }

    fn post(&self, body: &CompletionRequest<'_>) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.endpoint())
            .bearer_auth(&self.completion.api_key)
            .json(body)
    }

    /// One non-streaming attempt. The timeout covers the whole exchange,
    /// including reading the body; expiry drops the connection.
    pub async fn call_once(&self, input: &[InputItem], limit: Duration) -> UpstreamReply {
        let body = self.request_body(input, false);
        let exchange = async {
            let response = self.post(&body).send().await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();
            let body = response.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>(UpstreamReply { status, content_type, body })
        };

        match timeout(limit, exchange).await {
            Ok(Ok(reply)) => {
                if !reply.is_success() {
                    tracing::warn!("Upstream returned {}", reply.status);
                }
                reply
            }
            Ok(Err(e)) => {
                tracing::warn!("Upstream request failed: {}", e);
                UpstreamReply::timeout_or_network(e)
            }
            Err(_) => {
                tracing::warn!("Upstream request timed out after {:?}", limit);
                UpstreamReply::timeout_or_network(format!("timed out after {:?}", limit))
            }
        }
    }

    /// Non-streaming call driven by the retry policy
    pub async fn call_with_retry(&self, input: &[InputItem], policy: &RetryPolicy) -> UpstreamReply {
        policy
            .execute(|_, limit| self.call_once(input, limit))
            .await
    }

    /// Open a streaming call. One deadline covers the time until response
    /// headers arrive, and for a failed call the error body as well. A
    /// successful body is then read without a deadline.
    pub async fn open_stream(
        &self,
        input: &[InputItem],
        limit: Duration,
    ) -> Result<reqwest::Response, StreamOpenError> {
        let deadline = Instant::now() + limit;
        let body = self.request_body(input, true);
        let request = self.post(&body).header(header::ACCEPT, "text/event-stream");

        let response = match timeout_at(deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(StreamOpenError::Network(e.to_string())),
            Err(_) => return Err(StreamOpenError::Timeout(limit)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = timeout_at(deadline, response.text())
                .await
                .ok()
                .and_then(|r| r.ok())
                .unwrap_or_default();
            return Err(StreamOpenError::Status { status: status.as_u16(), body });
        }

        Ok(response)
    }
}
