//! Data Transfer Objects for the endpoint HTTP API.

use serde::{Deserialize, Serialize};

use crate::domain::{Conversation, Message};
use crate::ports::{EndpointDescriptor, EndpointKind};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request body for POST /endpoints/:name/generate.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Conversation history, oldest first.
    pub messages: Vec<Message>,
    /// Host conversation id, forwarded to relay services as the session id.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl GenerateRequest {
    /// Converts the request into the conversation handed to an endpoint.
    pub fn into_conversation(self) -> Conversation {
        let conversation = Conversation::new(self.messages);
        match self.conversation_id {
            Some(id) => conversation.with_session_id(id),
            None => conversation,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One configured endpoint in GET /endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub name: String,
    pub kind: EndpointKind,
    pub weight: u32,
    pub model: Option<String>,
}

impl EndpointSummary {
    pub fn new(name: impl Into<String>, descriptor: EndpointDescriptor) -> Self {
        Self {
            name: name.into(),
            kind: descriptor.kind,
            weight: descriptor.weight,
            model: descriptor.model,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }
}
