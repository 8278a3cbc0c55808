//! Application configuration module
//!
//! Configuration is read from an optional file (path in
//! `SUPPLEMENT_FLOW_CONFIG`, default `config/endpoints`, format inferred from
//! the extension) and then overridden by environment variables with the
//! `SUPPLEMENT_FLOW` prefix, using `__` to separate nested values.
//!
//! # Example
//!
//! ```no_run
//! use supplement_flow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("{} endpoints configured", config.endpoints.len());
//! ```

mod ai;
mod database;
mod endpoint;
mod error;
mod server;
mod video;

pub use ai::AiConfig;
pub use database::{DatabaseConfig, PoolConfig};
pub use endpoint::{checked_weight, CompletionEndpointConfig, EndpointConfig, RelayEndpointConfig};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use video::{RetryConfig, VideoConfig};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "SUPPLEMENT_FLOW_CONFIG";

/// Configuration file used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/endpoints";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion API transport settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Educational video search
    #[serde(default)]
    pub video: VideoConfig,

    /// PostgreSQL product catalog; absent means in-memory catalog
    pub database: Option<DatabaseConfig>,

    /// JSON product catalog for the in-memory store
    pub catalog_path: Option<PathBuf>,

    /// Named endpoints
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

impl AppConfig {
    /// Load configuration from the configured file and environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the file named by `SUPPLEMENT_FLOW_CONFIG`, if it exists
    /// 3. Overlays environment variables with `SUPPLEMENT_FLOW` prefix
    ///
    /// # Environment Variable Format
    ///
    /// - `SUPPLEMENT_FLOW__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SUPPLEMENT_FLOW__ENDPOINTS__RELAY__URL=...` -> `endpoints.relay.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or values cannot be
    /// deserialized into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from `path` (extension optional) plus environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SUPPLEMENT_FLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found; endpoint errors carry the
    /// endpoint name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.video.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }

        if self.endpoints.is_empty() {
            return Err(ValidationError::NoEndpointsConfigured);
        }
        for (name, endpoint) in &self.endpoints {
            endpoint.validate(name)?;
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
