//! Axum routes for the endpoint API.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{generate, health, list_endpoints, EndpointAppState};

/// Creates the routing table.
///
/// - GET /health - Liveness check
/// - GET /endpoints - Configured endpoints
/// - POST /endpoints/:name/generate - SSE answer stream
pub fn endpoint_routes() -> Router<EndpointAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/endpoints", get(list_endpoints))
        .route("/endpoints/:name/generate", post(generate))
}

/// Router with state applied, ready to serve.
pub fn endpoint_router(state: EndpointAppState) -> Router {
    endpoint_routes().with_state(state)
}
