//! AI Provider Port - Interface for LLM completion integrations.
//!
//! This port abstracts the "responses" style completion API the endpoints
//! orchestrate: role-tagged input items, optional function and file-search
//! tools, and optional JSON-schema constrained output.
//!
//! # Design
//!
//! - One request/response call; endpoints simulate streaming themselves
//! - Function calls come back as raw JSON argument strings
//! - Tool results are fed back as `FunctionCallOutput` input items
//! - Error types classify transient failures for retry
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl AIProvider for EchoProvider {
//!     async fn respond(&self, request: ResponseRequest) -> Result<ResponseOutput, AIError> {
//!         Ok(ResponseOutput::text("Hello!"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for AI/LLM provider interactions.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Submit one request and wait for the whole response.
    async fn respond(&self, request: ResponseRequest) -> Result<ResponseOutput, AIError>;
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRequest {
    /// Model identifier (e.g. "gpt-4o").
    pub model: String,
    /// Ordered input items (messages, earlier tool calls and their outputs).
    pub input: Vec<InputItem>,
    /// Tools the model may use.
    pub tools: Vec<ToolSpec>,
    /// Forces a particular tool.
    pub tool_choice: Option<ToolChoice>,
    /// Constrains the output text to a JSON schema.
    pub output_format: Option<JsonSchemaFormat>,
}

impl ResponseRequest {
    /// Creates an empty request for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: Vec::new(),
            tools: Vec::new(),
            tool_choice: None,
            output_format: None,
        }
    }

    /// Adds a message.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.input.push(InputItem::Message(Message::new(role, content)));
        self
    }

    /// Replaces the input items.
    pub fn with_input(mut self, input: Vec<InputItem>) -> Self {
        self.input = input;
        self
    }

    /// Adds a tool.
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    /// Forces a tool choice.
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Sets the JSON schema output format.
    pub fn with_output_format(mut self, format: JsonSchemaFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// One item of request input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    /// A role-tagged message.
    Message(Message),
    /// A function call the model made in an earlier response.
    FunctionCall(FunctionCall),
    /// The result of executing a function call.
    FunctionCallOutput {
        /// Identifier of the call this answers.
        call_id: String,
        /// Result text.
        output: String,
    },
}

/// A message in the request input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// A tool available to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolSpec {
    /// A locally executed function.
    Function(FunctionDefinition),
    /// Hosted retrieval over vector stores.
    FileSearch {
        /// Stores to search.
        vector_store_ids: Vec<String>,
    },
}

/// Declaration of a callable function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    /// Function name the model calls.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON Schema for the arguments.
    pub parameters: serde_json::Value,
    /// Whether arguments must match the schema exactly.
    pub strict: bool,
}

impl FunctionDefinition {
    /// Creates a strict function definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: true,
        }
    }
}

/// Forced tool selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    /// Always run file search.
    FileSearch,
}

/// Named JSON schema the output text must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchemaFormat {
    /// Schema name.
    pub name: String,
    /// The schema itself.
    pub schema: serde_json::Value,
}

impl JsonSchemaFormat {
    /// Creates a new output format.
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Identifier to answer with a `FunctionCallOutput`.
    pub call_id: String,
    /// Function name.
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

/// Response from a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseOutput {
    /// Concatenated output text.
    pub text: String,
    /// Function calls requested by the model, in order.
    pub function_calls: Vec<FunctionCall>,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

impl ResponseOutput {
    /// Creates a text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Adds a function call.
    pub fn with_function_call(mut self, call: FunctionCall) -> Self {
        self.function_calls.push(call);
        self
    }

    /// Returns calls to the named function.
    pub fn calls_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionCall> + 'a {
        self.function_calls.iter().filter(move |call| call.name == name)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the input.
    pub input_tokens: u32,
    /// Tokens in the output.
    pub output_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// AI provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Context (prompt + history) exceeds model limit.
    #[error("context too long")]
    ContextTooLong,

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
