//! Endpoint table configuration
//!
//! Each named endpoint is a `type`-tagged entry:
//!
//! ```toml
//! [endpoints.flowise]
//! type = "custom"
//! url = "https://flows.example.com/api/v1/prediction/abc"
//!
//! [endpoints.advisor]
//! type = "supplement_flow"
//! openai_api_key = "sk-..."
//! vector_store_id = "vs_123"
//! ```

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Configuration of one named endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointConfig {
    /// Relay to an external chat-flow service
    Custom(RelayEndpointConfig),

    /// Tool-orchestrated supplement advisor
    #[serde(alias = "supplementFlow")]
    SupplementFlow(CompletionEndpointConfig),

    /// File-search product lookup
    #[serde(alias = "supplementVectorSearch")]
    SupplementVectorSearch(CompletionEndpointConfig),
}

/// Settings for a relay endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RelayEndpointConfig {
    /// Service URL the question is POSTed to
    pub url: String,

    /// Optional bearer token
    pub api_key: Option<Secret<String>>,

    /// Relative routing weight
    #[serde(default = "default_weight")]
    pub weight: i64,

    /// Opaque model label reported in listings
    pub model: Option<String>,
}

/// Settings for an OpenAI-backed endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionEndpointConfig {
    /// OpenAI API key
    pub openai_api_key: Secret<String>,

    /// Relative routing weight
    #[serde(default = "default_weight")]
    pub weight: i64,

    /// Completion model, defaults to the `ai.default_model`
    pub model: Option<String>,

    /// Vector store searched by file search
    pub vector_store_id: String,
}

impl EndpointConfig {
    /// Relative routing weight
    pub fn weight(&self) -> i64 {
        match self {
            Self::Custom(c) => c.weight,
            Self::SupplementFlow(c) | Self::SupplementVectorSearch(c) => c.weight,
        }
    }

    /// Validate the endpoint named `name`
    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        checked_weight(name, self.weight())?;

        match self {
            Self::Custom(relay) => {
                require_http_url("url", &relay.url)
                    .map_err(|e| ValidationError::endpoint(name, e.to_string()))?;
            }
            Self::SupplementFlow(completion) | Self::SupplementVectorSearch(completion) => {
                if completion.openai_api_key.expose_secret().trim().is_empty() {
                    return Err(ValidationError::endpoint(name, "openai_api_key is empty"));
                }
                if completion.vector_store_id.trim().is_empty() {
                    return Err(ValidationError::endpoint(name, "vector_store_id is empty"));
                }
            }
        }
        Ok(())
    }
}

/// Converts a configured weight to the routing weight, rejecting non-positive values.
pub fn checked_weight(name: &str, weight: i64) -> Result<u32, ValidationError> {
    u32::try_from(weight)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| ValidationError::endpoint(name, format!("weight must be positive, got {}", weight)))
}

/// Requires an absolute http(s) URL.
pub(crate) fn require_http_url(field: &'static str, url: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidUrl {
        field,
        url: url.to_string(),
    };
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(invalid()),
    }
}

fn default_weight() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> EndpointConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_custom_defaults() {
        let config = parse(json!({ "type": "custom", "url": "http://localhost:3000/api" }));

        let EndpointConfig::Custom(relay) = &config else {
            panic!("expected custom endpoint");
        };
        assert_eq!(relay.weight, 1);
        assert!(relay.api_key.is_none());
        assert!(config.validate("relay").is_ok());
    }

    #[test]
    fn test_accepts_camel_case_type_names() {
        let config = parse(json!({
            "type": "supplementFlow",
            "openai_api_key": "sk-test",
            "vector_store_id": "vs_1"
        }));
        assert!(matches!(config, EndpointConfig::SupplementFlow(_)));

        let config = parse(json!({
            "type": "supplement_vector_search",
            "openai_api_key": "sk-test",
            "vector_store_id": "vs_1",
            "weight": 4,
            "model": "gpt-4o-mini"
        }));
        assert_eq!(config.weight(), 4);
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result: Result<EndpointConfig, _> =
            serde_json::from_value(json!({ "type": "tgi", "url": "http://x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let config = parse(json!({ "type": "custom", "url": "not a url" }));
        let err = config.validate("relay").unwrap_err();
        assert!(err.to_string().contains("relay"));

        let config = parse(json!({ "type": "custom", "url": "ftp://files.example.com" }));
        assert!(config.validate("relay").is_err());
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let config = parse(json!({ "type": "custom", "url": "http://x.example", "weight": 0 }));
        assert!(config.validate("relay").is_err());

        let config = parse(json!({ "type": "custom", "url": "http://x.example", "weight": -2 }));
        assert!(config.validate("relay").is_err());
    }

    #[test]
    fn test_rejects_blank_completion_settings() {
        let config = parse(json!({
            "type": "supplement_flow",
            "openai_api_key": "",
            "vector_store_id": "vs_1"
        }));
        assert!(config.validate("advisor").is_err());

        let config = parse(json!({
            "type": "supplement_flow",
            "openai_api_key": "sk-test",
            "vector_store_id": " "
        }));
        assert!(config.validate("advisor").is_err());
    }

    #[test]
    fn test_checked_weight() {
        assert_eq!(checked_weight("x", 3).unwrap(), 3);
        assert!(checked_weight("x", 0).is_err());
        assert!(checked_weight("x", i64::MAX).is_err());
    }
}
