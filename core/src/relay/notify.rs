//! Telegram notification fan-out
//! Sends one message to every configured chat, concurrently and independently

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tokio::time::{timeout, Duration};

use crate::config::TelegramConfig;
use crate::relay::config::log_safe_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Fulfilled,
    Rejected,
}

/// Aggregate result of one fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyOutcome {
    /// True when at least one recipient accepted the message
    pub ok: bool,
    /// Per-recipient outcome, in configured recipient order
    pub results: Vec<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct Notifier {
    http_client: Client,
    api_base: String,
    bot_token: String,
    chat_ids: Vec<String>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(http_client: Client, config: &TelegramConfig) -> Self {
        Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_ids: config.chat_ids.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn recipient_count(&self) -> usize {
        self.chat_ids.len()
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_ids.is_empty()
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    /// Deliver `text` to every recipient. Each delivery gets exactly one
    /// attempt with its own timeout; one failure never affects the others.
    pub async fn send_to_all(&self, text: &str) -> NotifyOutcome {
        if !self.is_configured() {
            tracing::warn!("Telegram notification skipped: no bot token or chat ids");
            return NotifyOutcome {
                ok: false,
                results: Vec::new(),
                message: Some("no token or chat ids".to_string()),
            };
        }

        let url = self.send_message_url();
        let deliveries = self
            .chat_ids
            .iter()
            .map(|chat_id| self.deliver(&url, chat_id, text));
        let results = join_all(deliveries).await;

        let fulfilled = results.iter().filter(|r| **r == DeliveryStatus::Fulfilled).count();
        tracing::info!(
            "Telegram notification delivered to {}/{} recipient(s)",
            fulfilled,
            results.len()
        );

        NotifyOutcome {
            ok: fulfilled > 0,
            results,
            message: None,
        }
    }

    async fn deliver(&self, url: &str, chat_id: &str, text: &str) -> DeliveryStatus {
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send();

        match timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => DeliveryStatus::Fulfilled,
            Ok(Ok(response)) => {
                tracing::warn!("Telegram rejected message for chat {}: {}", chat_id, response.status());
                DeliveryStatus::Rejected
            }
            Ok(Err(e)) => {
                tracing::warn!("Telegram delivery to chat {} failed: {}", chat_id, log_safe_error(e));
                DeliveryStatus::Rejected
            }
            Err(_) => {
                tracing::warn!("Telegram delivery to chat {} timed out", chat_id);
                DeliveryStatus::Rejected
            }
        }
    }
}
