//! Endpoint Port - The adapter contract exposed to the chat host.
//!
//! An endpoint turns a conversation into a lazy, finite stream of
//! [`StreamEvent`](crate::domain::StreamEvent)s. Invocation is single-shot:
//! the returned stream cannot be restarted.
//!
//! Hard failures (the relay's upstream errors) surface as `Err` before any
//! event is produced. Orchestrating endpoints instead convert failures into an
//! apology that is streamed like any other answer.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Conversation, EventStream};
use crate::ports::AIError;

/// Port for a configured chat endpoint.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Produces the streamed answer for `conversation`.
    async fn invoke(&self, conversation: &Conversation) -> Result<EventStream, EndpointError>;

    /// Describes the endpoint for listing and routing.
    fn descriptor(&self) -> EndpointDescriptor;
}

/// Which adapter variant an endpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Forwards the latest message to an HTTP service.
    DirectRelay,
    /// Model with a recommendation tool.
    SupplementFlow,
    /// File-search constrained product lookup.
    VectorSearch,
}

/// Static facts about an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub kind: EndpointKind,
    /// Relative routing weight (always positive).
    pub weight: u32,
    /// Completion model identifier, when the endpoint uses one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Endpoint invocation errors.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The conversation had no messages.
    #[error("conversation has no messages")]
    EmptyConversation,

    /// An upstream service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The upstream succeeded but returned no usable text.
    #[error("no response text received from the upstream service")]
    EmptyResponse,

    /// The request could not be sent or the response not read.
    #[error("transport error: {0}")]
    Transport(String),

    /// A tool call could not be executed.
    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    /// The completion provider failed.
    #[error(transparent)]
    Provider(#[from] AIError),

    /// Any other orchestration failure.
    #[error("{0}")]
    Runtime(String),
}

impl EndpointError {
    /// Creates an upstream status error.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Creates a tool execution error.
    pub fn tool_execution(message: impl Into<String>) -> Self {
        Self::ToolExecution(message.into())
    }

    /// Creates a runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// The apology streamed back when an orchestrating endpoint fails.
    pub fn user_message(&self) -> String {
        format!("Sorry, there was an error processing your request: {}", self)
    }
}
