//! Domain layer: conversations, the streaming contract and recommendation records.
//!
//! # Module Organization
//!
//! - `conversation` - Messages and conversation history handed in by the host
//! - `streaming` - Token events and the simulated chunked stream
//! - `recommendation` - Health profile, recommendation records, name normalization

pub mod conversation;
pub mod recommendation;
pub mod streaming;

pub use conversation::{Author, Conversation, Message};
pub use recommendation::{
    assemble_sections, normalize_name, EducationalVideo, HealthProfile,
    NutraceuticalRecommendation, Product, ProductRecommendation, WILDCARD_GROUP,
};
pub use streaming::{
    chunk_text, split_preserving_whitespace, stream_text, ChunkingOptions, EventStream,
    StreamEvent, Token,
};
