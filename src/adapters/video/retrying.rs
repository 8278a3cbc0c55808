//! Retrying wrapper around a VideoSearch.
//!
//! Wraps any search adapter with bounded exponential backoff and turns every
//! failure into `None`, so callers only ever see "a video" or "no video".
//!
//! # Example
//!
//! ```ignore
//! let search = RetryingVideoSearch::new(Arc::new(youtube), RetryPolicy::default());
//! let hit = search.find("magnesium supplement benefits").await;
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{VideoHit, VideoSearch};

/// Backoff parameters for the video search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Wait before the second attempt; doubles afterwards.
    pub base_delay: Duration,
    /// Ceiling for any single wait.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_millis(10_000))
    }
}

/// Video search with retry; never fails, only finds or doesn't.
#[derive(Clone)]
pub struct RetryingVideoSearch {
    inner: Arc<dyn VideoSearch>,
    policy: RetryPolicy,
}

impl RetryingVideoSearch {
    /// Wraps `inner` with `policy`.
    pub fn new(inner: Arc<dyn VideoSearch>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the configured policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Finds one video for `query`, retrying transient failures.
    pub async fn find(&self, query: &str) -> Option<VideoHit> {
        if query.trim().is_empty() {
            tracing::warn!("Empty query provided to video search");
            return None;
        }

        for attempt in 1..=self.policy.max_retries {
            match self.inner.search(query).await {
                Ok(Some(hit)) => return Some(hit),
                Ok(None) => {
                    tracing::warn!(query, "No videos found");
                    return None;
                }
                Err(err) if !err.is_retryable() => {
                    tracing::error!(query, attempt, error = %err, "Non-retryable video search error");
                    return None;
                }
                Err(err) => {
                    tracing::error!(query, attempt, error = %err, "Retryable video search error");
                    if attempt < self.policy.max_retries {
                        let wait = self.policy.delay_after(attempt);
                        tracing::info!(wait_ms = wait.as_millis() as u64, "Waiting before retry");
                        sleep(wait).await;
                    }
                }
            }
        }

        tracing::error!(
            query,
            attempts = self.policy.max_retries,
            "Video search failed after all attempts"
        );
        None
    }
}
