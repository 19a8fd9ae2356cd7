//! Retry policy for the non-streaming completion call

use std::future::Future;
use tokio::time::Duration;

/// Outcome of one attempt, as seen by the retry loop
pub trait AttemptOutcome {
    fn is_success(&self) -> bool;
}

/// A single attempt in a retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub timeout: Duration,
}

/// Ordered list of attempts, run one after another until one succeeds.
/// Always holds at least one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: Vec<Attempt>,
}

impl RetryPolicy {
    /// Build a policy from per-attempt timeouts in seconds.
    /// An empty list falls back to the default policy.
    pub fn from_timeouts_secs(timeouts: &[u64]) -> Self {
        let attempts: Vec<Attempt> = timeouts
            .iter()
            .map(|secs| Attempt { timeout: Duration::from_secs(*secs) })
            .collect();

        if attempts.is_empty() {
            tracing::warn!("Empty retry policy configured, using default");
            return Self::default();
        }
        Self { attempts }
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Run `call` for each attempt in order, stopping at the first success.
    /// Returns the outcome of the last attempt made.
    pub async fn execute<T, F, Fut>(&self, mut call: F) -> T
    where
        T: AttemptOutcome,
        F: FnMut(usize, Duration) -> Fut,
        Fut: Future<Output = T>,
    {
        let last = self.attempts.len() - 1;
        let mut idx = 0;
        loop {
            let attempt = self.attempts[idx];
            let outcome = call(idx, attempt.timeout).await;
            if outcome.is_success() || idx == last {
                if idx > 0 && outcome.is_success() {
                    tracing::info!("Upstream retry succeeded (attempt {})", idx + 1);
                }
                return outcome;
            }
            tracing::warn!(
                "Upstream attempt {} of {} failed, retrying",
                idx + 1,
                self.attempts.len()
            );
            idx += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_timeouts_secs(&[25, 30])
    }
}
