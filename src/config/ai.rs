//! Completion API configuration
//!
//! Shared transport settings for every OpenAI-backed endpoint. API keys are
//! per endpoint and live in the endpoint table.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::endpoint::require_http_url;

/// Upper bound for `max_retries`.
const MAX_RETRIES_LIMIT: u32 = 10;

/// Completion API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Base URL of the Responses API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when an endpoint does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate completion API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_http_url("ai.base_url", &self.base_url)?;
        if self.default_model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__DEFAULT_MODEL"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::InvalidRetryPolicy(
                "ai.max_retries must be at most 10",
            ));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_bad_base_url() {
        let config = AiConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { field: "ai.base_url", .. })
        ));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_caps_retries() {
        let config = AiConfig {
            max_retries: MAX_RETRIES_LIMIT + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetryPolicy(_))
        ));

        let config = AiConfig {
            max_retries: MAX_RETRIES_LIMIT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
