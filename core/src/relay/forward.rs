//! Optional webhook that receives a raw copy of every accepted lead

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::time::{timeout, Duration};

use crate::config::LeadConfig;
use crate::relay::config::log_safe_error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ForwardOutcome {
    pub ok: bool,
    /// Raw response text, when one was received
    pub response: Option<String>,
}

pub struct LeadForwarder {
    http_client: Client,
    url: Option<String>,
    timeout: Duration,
}

impl LeadForwarder {
    pub fn new(http_client: Client, config: &LeadConfig) -> Self {
        Self {
            http_client,
            url: config.forward_url.clone().filter(|u| !u.trim().is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// POST the payload unchanged. Returns `None` when no destination is configured.
    pub async fn forward(&self, payload: &Value) -> Option<ForwardOutcome> {
        let url = self.url.as_deref()?;

        let exchange = async {
            let response = self.http_client.post(url).json(payload).send().await?;
            let ok = response.status().is_success();
            let text = response.text().await.ok();
            Ok::<_, reqwest::Error>(ForwardOutcome { ok, response: text })
        };

        let outcome = match timeout(self.timeout, exchange).await {
            Ok(Ok(outcome)) => {
                if !outcome.ok {
                    tracing::warn!("Lead forward rejected by destination");
                }
                outcome
            }
            Ok(Err(e)) => {
                tracing::warn!("Lead forward failed: {}", log_safe_error(e));
                ForwardOutcome::default()
            }
            Err(_) => {
                tracing::warn!("Lead forward timed out after {:?}", self.timeout);
                ForwardOutcome::default()
            }
        };
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forwarder(url: Option<String>) -> LeadForwarder {
        LeadForwarder::new(
            Client::new(),
            &LeadConfig { forward_url: url, timeout_secs: 5 },
        )
    }

    #[tokio::test]
    async fn posts_payload_unchanged() {
        let server = MockServer::start().await;
        let payload = json!({"name": "Ivanov", "phone": "+7900", "date": "2024-05-01", "extra": [1, 2]});

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = forwarder(Some(format!("{}/hook", server.uri())))
            .forward(&payload)
            .await
            .unwrap();

        assert_eq!(outcome, ForwardOutcome { ok: true, response: Some("accepted".into()) });
    }

    #[tokio::test]
    async fn records_rejection_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let outcome = forwarder(Some(server.uri())).forward(&json!({})).await.unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.response.as_deref(), Some("down"));
    }

    #[tokio::test]
    async fn transport_failure_is_recorded_not_raised() {
        let outcome = forwarder(Some("http://127.0.0.1:9/hook".into()))
            .forward(&json!({}))
            .await
            .unwrap();

        assert_eq!(outcome, ForwardOutcome::default());
    }

    #[tokio::test]
    async fn unconfigured_forwarder_skips() {
        let forwarder = forwarder(Some("  ".into()));
        assert!(!forwarder.is_configured());
        assert!(forwarder.forward(&json!({})).await.is_none());
    }
}
