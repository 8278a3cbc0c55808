//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the endpoints and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Completion API (messages, tools, JSON-schema output)
//! - `VideoSearch` - Auxiliary educational video search
//! - `ProductStore` - Product catalog lookup
//! - `Endpoint` - The streaming adapter contract offered to the chat host

mod ai_provider;
mod endpoint;
mod product_store;
mod video_search;

pub use ai_provider::{
    AIError, AIProvider, FunctionCall, FunctionDefinition, InputItem, JsonSchemaFormat, Message,
    MessageRole, ResponseOutput, ResponseRequest, TokenUsage, ToolChoice, ToolSpec,
};
pub use endpoint::{Endpoint, EndpointDescriptor, EndpointError, EndpointKind};
pub use product_store::{ProductQuery, ProductStore, ProductStoreError};
pub use video_search::{VideoHit, VideoSearch, VideoSearchError};
