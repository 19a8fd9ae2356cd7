//! Periodic self-ping that keeps hosted instances from idling out

use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::Duration;

const FALLBACK_INTERVAL: Duration = Duration::from_secs(240);

/// Spawn a detached task that GETs `url` every `interval`.
/// Failures are logged at debug level and otherwise ignored.
/// A zero interval falls back to the default period.
pub fn spawn_keepalive(client: Client, url: String, interval: Duration) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        tracing::warn!("Keep-alive interval is zero, using {:?}", FALLBACK_INTERVAL);
        FALLBACK_INTERVAL
    } else {
        interval
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match client.get(&url).timeout(interval).send().await {
                Ok(resp) => tracing::debug!("Keep-alive ping {}: {}", url, resp.status()),
                Err(e) => tracing::debug!("Keep-alive ping {} failed: {}", url, e),
            }
        }
    })
}
