//! HTTP adapter - SSE API over the configured endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{EndpointSummary, ErrorResponse, GenerateRequest};
pub use handlers::{EndpointApiError, EndpointAppState};
pub use routes::{endpoint_router, endpoint_routes};
