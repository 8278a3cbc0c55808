//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses (text, function calls or errors), consumed in order
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("Hello, I'm the assistant!");
//!
//! let response = provider.respond(request).await?;
//! assert_eq!(response.text, "Hello, I'm the assistant!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{AIError, AIProvider, FunctionCall, ResponseOutput, ResponseRequest, TokenUsage};

const MOCK_MODEL: &str = "mock-model-1";

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ResponseRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response.
    Success(ResponseOutput),
    /// Return an error.
    Error(AIError),
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a text response to the queue.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        let output = ResponseOutput {
            text: text.into(),
            usage: TokenUsage::new(10, 20),
            model: MOCK_MODEL.to_string(),
            ..Default::default()
        };
        self.with_output(output)
    }

    /// Adds a response that requests one function call.
    pub fn with_function_call(
        self,
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        let output = ResponseOutput {
            model: MOCK_MODEL.to_string(),
            ..Default::default()
        }
        .with_function_call(FunctionCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        });
        self.with_output(output)
    }

    /// Adds a fully specified response.
    pub fn with_output(self, output: ResponseOutput) -> Self {
        self.push(MockResponse::Success(output));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ResponseRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(ResponseOutput::text("Mock response")))
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn respond(&self, request: ResponseRequest) -> Result<ResponseOutput, AIError> {
        self.calls.lock().unwrap().push(request);

        match self.next_response() {
            MockResponse::Success(output) => Ok(output),
            MockResponse::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MessageRole;

    fn test_request() -> ResponseRequest {
        ResponseRequest::new("gpt-4o").with_message(MessageRole::User, "Hello")
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_response("First")
            .with_function_call("call_1", "lookup", "{}")
            .with_error(AIError::AuthenticationFailed);

        let r1 = provider.respond(test_request()).await.unwrap();
        let r2 = provider.respond(test_request()).await.unwrap();
        let r3 = provider.respond(test_request()).await;

        assert_eq!(r1.text, "First");
        assert_eq!(r2.function_calls[0].name, "lookup");
        assert!(matches!(r3, Err(AIError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn mock_provider_returns_default_after_exhausted() {
        let provider = MockAIProvider::new().with_response("Only one");

        provider.respond(test_request()).await.unwrap();
        let r2 = provider.respond(test_request()).await.unwrap();

        assert_eq!(r2.text, "Mock response");
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.respond(test_request()).await.unwrap();
        provider.respond(test_request()).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.get_calls()[0].model, "gpt-4o");
    }
}
