//! Application layer - Orchestration across ports.
//!
//! Coordinates the completion provider, video search and product catalog
//! into the recommendation answer used by the supplement flow.

pub mod recommendation_pipeline;

pub use recommendation_pipeline::{RecommendationPipeline, MAX_RECOMMENDATIONS};
