//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion providers (OpenAI Responses API, mock)
//! - `video` - Educational video search (YouTube, retry wrapper, mock)
//! - `products` - Product catalog (PostgreSQL, in-memory)
//! - `endpoints` - The three chat endpoint variants and their factory
//! - `http` - SSE API exposing the endpoints

pub mod ai;
pub mod endpoints;
pub mod http;
pub mod products;
pub mod video;

pub use endpoints::EndpointFactory;
