//! Supplement Flow server.
//!
//! Loads configuration, builds every configured endpoint and serves them over
//! the SSE API until interrupted.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::{HeaderValue, Method};
use reqwest::Client;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use supplement_flow::adapters::http::{endpoint_router, EndpointAppState};
use supplement_flow::adapters::products::{InMemoryProductStore, PostgresProductStore};
use supplement_flow::adapters::video::{RetryingVideoSearch, YouTubeConfig, YouTubeSearch};
use supplement_flow::adapters::EndpointFactory;
use supplement_flow::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use supplement_flow::ports::{Endpoint, ProductStore, ProductStoreError};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to open database pool: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Catalog(#[from] ProductStoreError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for StartupError {
    fn from(err: ValidationError) -> Self {
        Self::Config(err.into())
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let client = Client::builder().build()?;

    let youtube = YouTubeSearch::new(
        YouTubeConfig::new(config.video.youtube_api_key.clone())
            .with_base_url(&config.video.base_url)
            .with_timeout(config.video.timeout()),
        client.clone(),
    );
    if config.video.youtube_api_key.is_none() {
        tracing::warn!("No YouTube API key configured; educational videos are disabled");
    }
    let videos = Arc::new(RetryingVideoSearch::new(
        Arc::new(youtube),
        config.video.retry.policy(),
    ));

    let products = product_store(&config)?;
    let factory = EndpointFactory::new(client, config.ai.clone(), videos, products);

    let mut endpoints: BTreeMap<String, Arc<dyn Endpoint>> = BTreeMap::new();
    for (name, endpoint_config) in &config.endpoints {
        endpoints.insert(name.clone(), factory.build(name, endpoint_config)?);
    }

    let state = EndpointAppState::new(endpoints).with_keep_alive(config.server.sse_keep_alive());
    let app = endpoint_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, endpoints = config.endpoints.len(), "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn product_store(config: &AppConfig) -> Result<Arc<dyn ProductStore>, StartupError> {
    if let Some(database) = &config.database {
        tracing::info!("Using PostgreSQL product catalog");
        return Ok(Arc::new(PostgresProductStore::new(database.connect_lazy()?)));
    }

    match &config.catalog_path {
        Some(path) => Ok(Arc::new(InMemoryProductStore::from_json_file(path)?)),
        None => {
            tracing::warn!("No product catalog configured; product recommendations are disabled");
            Ok(Arc::new(InMemoryProductStore::default()))
        }
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
