//! Product catalog database configuration
//!
//! Optional: without a `database` section the catalog is served from memory.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use super::error::ValidationError;

/// Connection settings for the PostgreSQL product catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` connection URL; may carry credentials
    pub url: Secret<String>,

    #[serde(default)]
    pub pool: PoolConfig,
}

/// Pool sizing. The catalog sees one short lookup per recommended
/// supplement, so a small pool is enough.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Secret::new(url.into()),
            pool: PoolConfig::default(),
        }
    }

    fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        self.url.expose_secret().parse()
    }

    /// Builds a pool that connects on first use, so startup does not wait
    /// on the database.
    pub fn connect_lazy(&self) -> Result<PgPool, sqlx::Error> {
        let options = self.connect_options()?;
        Ok(PgPoolOptions::new()
            .min_connections(self.pool.min_connections)
            .max_connections(self.pool.max_connections)
            .acquire_timeout(Duration::from_secs(self.pool.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.pool.idle_timeout_secs))
            .connect_lazy_with(options))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.expose_secret();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("database.url"));
        }
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        self.connect_options()
            .map_err(|_| ValidationError::InvalidDatabaseUrl)?;

        if self.pool.max_connections == 0 || self.pool.min_connections > self.pool.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.pool.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}
