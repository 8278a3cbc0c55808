//! OpenAI Provider - Implementation of AIProvider for OpenAI's Responses API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::with_client(config, reqwest::Client::new());
//! ```
//!
//! Transient failures (rate limits, 5xx, network) are retried with
//! exponential backoff up to `max_retries` times. Error bodies are logged in
//! full; only the API's short `error.message` is carried in the `AIError`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, FunctionCall, InputItem, MessageRole, ResponseOutput, ResponseRequest,
    TokenUsage, ToolChoice, ToolSpec,
};

/// Ceiling for a single backoff wait between retries.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Default model when a request leaves it blank.
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_secret(Secret::new(api_key.into()))
    }

    /// Creates a new configuration from an already-wrapped key.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a provider sharing an existing HTTP client.
    pub fn with_client(config: OpenAIConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Builds the responses endpoint URL.
    fn responses_url(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &ResponseRequest) -> OpenAIRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        OpenAIRequest {
            model,
            input: request.input.iter().map(OpenAIInputItem::from).collect(),
            tools: request.tools.iter().map(OpenAITool::from).collect(),
            tool_choice: request.tool_choice.as_ref().map(OpenAIToolChoice::from),
            text: request.output_format.as_ref().map(|format| OpenAIText {
                format: OpenAIFormat {
                    format_type: "json_schema",
                    name: format.name.clone(),
                    schema: format.schema.clone(),
                    strict: true,
                },
            }),
        }
    }

    /// Sends a request and handles transport errors.
    async fn send_request(&self, request: &ResponseRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.responses_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .timeout(self.config.timeout)
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %error_body, "OpenAI request rejected");
        let message = error_message(status, &error_body);

        match status.as_u16() {
            401 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("context_length_exceeded")
                    || error_body.contains("maximum context length")
                {
                    Err(AIError::ContextTooLong)
                } else {
                    Err(AIError::InvalidRequest(message))
                }
            }
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status.as_u16(),
                message
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status.as_u16(),
                message
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                        if let Ok(secs) = rest[..num_end].parse::<u32>() {
                            return secs;
                        }
                    }
                }
            }
        }
        30
    }

    /// Parses a successful response body.
    async fn parse_response(&self, response: Response) -> Result<ResponseOutput, AIError> {
        let response = self.handle_response_status(response).await?;

        let body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(body.into_output())
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn respond(&self, request: ResponseRequest) -> Result<ResponseOutput, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send_request(&request).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(output) => {
                    tracing::debug!(
                        model = %output.model,
                        function_calls = output.function_calls.len(),
                        total_tokens = output.usage.total_tokens,
                        "OpenAI response received"
                    );
                    return Ok(output);
                }
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    tracing::warn!(attempt = retry_count + 1, error = %err, "OpenAI request failed, retrying");
                }
                Err(err) => return Err(err),
            }

            sleep(backoff_delay(retry_count)).await;
            retry_count += 1;
        }
    }
}

/// Exponential backoff: 1s, 2s, 4s, ... capped at [`MAX_BACKOFF`].
fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(retry_count)).min(MAX_BACKOFF)
}

/// Short, user-safe description of a rejected request: the API's
/// `error.message` when present, otherwise the status reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        })
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    input: Vec<OpenAIInputItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAITool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<OpenAIToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<OpenAIText>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIInputItem {
    Message {
        role: MessageRole,
        content: String,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl From<&InputItem> for OpenAIInputItem {
    fn from(item: &InputItem) -> Self {
        match item {
            InputItem::Message(message) => OpenAIInputItem::Message {
                role: message.role,
                content: message.content.clone(),
            },
            InputItem::FunctionCall(call) => OpenAIInputItem::FunctionCall {
                call_id: call.call_id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
            InputItem::FunctionCallOutput { call_id, output } => {
                OpenAIInputItem::FunctionCallOutput {
                    call_id: call_id.clone(),
                    output: output.clone(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAITool {
    Function {
        name: String,
        description: String,
        parameters: serde_json::Value,
        strict: bool,
    },
    FileSearch {
        vector_store_ids: Vec<String>,
    },
}

impl From<&ToolSpec> for OpenAITool {
    fn from(tool: &ToolSpec) -> Self {
        match tool {
            ToolSpec::Function(def) => OpenAITool::Function {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
                strict: def.strict,
            },
            ToolSpec::FileSearch { vector_store_ids } => OpenAITool::FileSearch {
                vector_store_ids: vector_store_ids.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIToolChoice {
    FileSearch,
}

impl From<&ToolChoice> for OpenAIToolChoice {
    fn from(choice: &ToolChoice) -> Self {
        match choice {
            ToolChoice::FileSearch => OpenAIToolChoice::FileSearch,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIText {
    format: OpenAIFormat,
}

#[derive(Debug, Serialize)]
struct OpenAIFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    name: String,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    output: Vec<OpenAIOutputItem>,
    usage: Option<OpenAIUsage>,
}

impl OpenAIResponse {
    fn into_output(self) -> ResponseOutput {
        let mut text = String::new();
        let mut function_calls = Vec::new();

        for item in self.output {
            match item {
                OpenAIOutputItem::Message { content } => {
                    for part in content {
                        if let OpenAIContent::OutputText { text: part_text } = part {
                            text.push_str(&part_text);
                        }
                    }
                }
                OpenAIOutputItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => function_calls.push(FunctionCall {
                    call_id,
                    name,
                    arguments,
                }),
                OpenAIOutputItem::Other => {}
            }
        }

        ResponseOutput {
            text,
            function_calls,
            usage: self
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
                .unwrap_or_default(),
            model: self.model,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIOutputItem {
    Message {
        #[serde(default)]
        content: Vec<OpenAIContent>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIContent {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FunctionDefinition, JsonSchemaFormat, Message};

    fn provider() -> OpenAIProvider {
        OpenAIProvider::with_client(OpenAIConfig::new("test-key"), Client::new())
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn responses_url_trims_trailing_slash() {
        let provider = OpenAIProvider::with_client(
            OpenAIConfig::new("k").with_base_url("http://localhost:9/v1/"),
            Client::new(),
        );
        assert_eq!(provider.responses_url(), "http://localhost:9/v1/responses");
    }

    #[test]
    fn request_serializes_tools_and_items() {
        let request = ResponseRequest::new("gpt-4o")
            .with_input(vec![
                InputItem::Message(Message::system("rules")),
                InputItem::FunctionCall(FunctionCall {
                    call_id: "call_1".to_string(),
                    name: "getAllRecommendations".to_string(),
                    arguments: "{}".to_string(),
                }),
                InputItem::FunctionCallOutput {
                    call_id: "call_1".to_string(),
                    output: "result".to_string(),
                },
            ])
            .with_tool(ToolSpec::Function(FunctionDefinition::new(
                "getAllRecommendations",
                "desc",
                serde_json::json!({"type": "object"}),
            )))
            .with_tool(ToolSpec::FileSearch {
                vector_store_ids: vec!["vs_1".to_string()],
            })
            .with_tool_choice(ToolChoice::FileSearch)
            .with_output_format(JsonSchemaFormat::new(
                "ProductResponseFormat",
                serde_json::json!({"type": "object"}),
            ));

        let json = serde_json::to_value(provider().to_openai_request(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(
            json["input"][0],
            serde_json::json!({"type": "message", "role": "system", "content": "rules"})
        );
        assert_eq!(json["input"][1]["type"], "function_call");
        assert_eq!(json["input"][2]["type"], "function_call_output");
        assert_eq!(json["input"][2]["output"], "result");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["strict"], true);
        assert_eq!(json["tools"][1]["vector_store_ids"][0], "vs_1");
        assert_eq!(json["tool_choice"], serde_json::json!({"type": "file_search"}));
        assert_eq!(json["text"]["format"]["type"], "json_schema");
        assert_eq!(json["text"]["format"]["name"], "ProductResponseFormat");
    }

    #[test]
    fn empty_model_falls_back_to_config() {
        let request = ResponseRequest::new("").with_message(MessageRole::User, "hi");
        let json = serde_json::to_value(provider().to_openai_request(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert!(json.get("tools").is_none());
        assert!(json.get("text").is_none());
    }

    #[test]
    fn response_collects_text_and_function_calls() {
        let body = r#"{
            "id": "resp_1",
            "model": "gpt-4o-2024-08-06",
            "output": [
                {"type": "file_search_call", "id": "fs_1", "status": "completed"},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Hello ", "annotations": []},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "there", "annotations": []}
                ]},
                {"type": "function_call", "id": "fc_1", "call_id": "call_9",
                 "name": "getAllRecommendations", "arguments": "{\"age\":30}"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 8, "total_tokens": 20}
        }"#;

        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        let output = parsed.into_output();

        assert_eq!(output.text, "Hello there");
        assert_eq!(output.model, "gpt-4o-2024-08-06");
        assert_eq!(output.usage.total_tokens, 20);
        assert_eq!(output.function_calls.len(), 1);
        assert_eq!(output.function_calls[0].call_id, "call_9");
        assert_eq!(output.function_calls[0].arguments, "{\"age\":30}");
    }

    #[test]
    fn error_message_keeps_only_api_message() {
        let body = r#"{"error":{"message":"Invalid schema","type":"invalid_request_error","param":"text.format.schema"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_REQUEST, body),
            "Invalid schema"
        );
    }

    #[test]
    fn error_message_hides_unstructured_bodies() {
        let body = "<html><body>upstream exploded at /srv/app.py:42</body></html>";
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, body),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_REQUEST, r#"{"error":{"message":""}}"#),
            "Bad Request"
        );
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(5), MAX_BACKOFF);
        assert_eq!(backoff_delay(200), MAX_BACKOFF);
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit reached. Please try again in 20s."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 20);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }
}
