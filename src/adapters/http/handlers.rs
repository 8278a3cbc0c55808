//! HTTP handlers for the endpoint API.
//!
//! Answers are delivered as Server-Sent Events, one `data:` line per
//! [`StreamEvent`](crate::domain::StreamEvent) serialized as JSON.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use uuid::Uuid;

use crate::ports::{Endpoint, EndpointError};

use super::dto::{EndpointSummary, ErrorResponse, GenerateRequest, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for endpoint handlers.
#[derive(Clone)]
pub struct EndpointAppState {
    endpoints: Arc<BTreeMap<String, Arc<dyn Endpoint>>>,
    keep_alive: Option<Duration>,
}

impl EndpointAppState {
    /// Creates a new EndpointAppState.
    pub fn new(endpoints: BTreeMap<String, Arc<dyn Endpoint>>) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            keep_alive: None,
        }
    }

    /// Sends SSE keep-alive comments at `interval` while a stream is open.
    pub fn with_keep_alive(mut self, interval: Option<Duration>) -> Self {
        self.keep_alive = interval;
        self
    }

    fn endpoint(&self, name: &str) -> Option<&Arc<dyn Endpoint>> {
        self.endpoints.get(name)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /endpoints - List configured endpoints in name order.
pub async fn list_endpoints(State(state): State<EndpointAppState>) -> impl IntoResponse {
    let summaries: Vec<EndpointSummary> = state
        .endpoints
        .iter()
        .map(|(name, endpoint)| EndpointSummary::new(name, endpoint.descriptor()))
        .collect();

    Json(summaries)
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /endpoints/:name/generate
// ════════════════════════════════════════════════════════════════════════════════

/// POST /endpoints/:name/generate - Stream an answer for a conversation.
///
/// # Errors
/// - 400 Bad Request: no messages
/// - 404 Not Found: unknown endpoint name
/// - 502 Bad Gateway: the endpoint's upstream failed before streaming
pub async fn generate(
    State(state): State<EndpointAppState>,
    Path(name): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, EndpointApiError> {
    let endpoint = state
        .endpoint(&name)
        .ok_or_else(|| EndpointApiError::NotFound(name.clone()))?;

    if request.messages.is_empty() {
        return Err(EndpointApiError::BadRequest(
            "messages must not be empty".to_string(),
        ));
    }

    let request_id = Uuid::new_v4();
    tracing::info!(
        endpoint = %name,
        %request_id,
        messages = request.messages.len(),
        "Generating answer"
    );

    let conversation = request.into_conversation();
    let events = endpoint
        .invoke(&conversation)
        .await
        .map_err(|e| EndpointApiError::from_endpoint(&name, e))?;

    let stream = events.map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().comment("unserializable event")),
        )
    });

    let sse = Sse::new(stream);
    Ok(match state.keep_alive {
        Some(interval) => sse.keep_alive(KeepAlive::new().interval(interval)).into_response(),
        None => sse.into_response(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for endpoint handlers.
#[derive(Debug)]
pub enum EndpointApiError {
    BadRequest(String),
    NotFound(String),
    BadGateway { code: &'static str, message: String },
}

impl EndpointApiError {
    /// Maps an invocation failure, logging it with the endpoint name.
    pub fn from_endpoint(name: &str, error: EndpointError) -> Self {
        let code = match &error {
            EndpointError::EmptyConversation => {
                return Self::BadRequest(error.to_string());
            }
            EndpointError::Upstream { .. } => "UPSTREAM_ERROR",
            EndpointError::EmptyResponse => "EMPTY_RESPONSE",
            EndpointError::Transport(_) => "TRANSPORT_ERROR",
            EndpointError::ToolExecution(_)
            | EndpointError::Provider(_)
            | EndpointError::Runtime(_) => "ENDPOINT_ERROR",
        };

        tracing::error!(endpoint = %name, error = %error, "Endpoint invocation failed");
        Self::BadGateway {
            code,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for EndpointApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            EndpointApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            EndpointApiError::NotFound(name) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found("Endpoint", &name))
            }
            EndpointApiError::BadGateway { code, message } => {
                (StatusCode::BAD_GATEWAY, ErrorResponse::new(code, message))
            }
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_conversation_maps_to_bad_request() {
        let error = EndpointApiError::from_endpoint("x", EndpointError::EmptyConversation);
        assert!(matches!(error, EndpointApiError::BadRequest(_)));
    }

    #[test]
    fn upstream_failure_maps_to_bad_gateway() {
        let error = EndpointApiError::from_endpoint("x", EndpointError::upstream(500, "boom"));

        let EndpointApiError::BadGateway { code, message } = error else {
            panic!("expected bad gateway");
        };
        assert_eq!(code, "UPSTREAM_ERROR");
        assert!(message.contains("500"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            EndpointApiError::NotFound("x".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EndpointApiError::from_endpoint("x", EndpointError::EmptyResponse)
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
