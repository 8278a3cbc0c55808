//! Video search configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::endpoint::require_http_url;
use super::error::ValidationError;
use crate::adapters::video::RetryPolicy;

/// YouTube search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    /// YouTube Data API key; without it no videos are returned
    pub youtube_api_key: Option<Secret<String>>,

    /// Base URL of the Data API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry settings for the video search
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait before the second attempt, in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Ceiling for any single wait, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Convert to the search wrapper's policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    /// Validate retry settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_retries == 0 {
            return Err(ValidationError::InvalidRetryPolicy("max_retries must be at least 1"));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidRetryPolicy(
                "base_delay_ms exceeds max_delay_ms",
            ));
        }
        Ok(())
    }
}

impl VideoConfig {
    /// Get the per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate video configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_http_url("video.base_url", &self.base_url)?;
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        self.retry.validate()
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    10_000
}
