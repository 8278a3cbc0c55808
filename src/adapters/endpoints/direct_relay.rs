//! Direct relay endpoint.
//!
//! Forwards the latest message to an external chat-flow service and replays
//! its answer word by word. Upstream failures are hard errors; nothing is
//! streamed for them.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::domain::{stream_text, ChunkingOptions, Conversation, EventStream};
use crate::ports::{Endpoint, EndpointDescriptor, EndpointError, EndpointKind};

/// Response fields checked for the answer text, in priority order.
pub const ANSWER_KEYS: [&str; 3] = ["text", "answer", "response"];

/// Relays the latest message to an HTTP chat-flow service.
pub struct DirectRelayEndpoint {
    client: Client,
    url: String,
    api_key: Option<Secret<String>>,
    weight: u32,
    model: Option<String>,
    chunking: ChunkingOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    question: &'a str,
    override_config: OverrideConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverrideConfig<'a> {
    session_id: Option<&'a str>,
}

impl DirectRelayEndpoint {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: None,
            weight: 1,
            model: None,
            chunking: ChunkingOptions::word_by_word(),
        }
    }

    /// Sends `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides chunk size and pacing.
    pub fn with_chunking(mut self, chunking: ChunkingOptions) -> Self {
        self.chunking = chunking;
        self
    }

    async fn fetch_answer(&self, conversation: &Conversation) -> Result<String, EndpointError> {
        let question = conversation
            .last_message()
            .map(|m| m.content.as_str())
            .ok_or(EndpointError::EmptyConversation)?;

        let body = RelayRequest {
            question,
            override_config: OverrideConfig {
                session_id: conversation.session_id(),
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        tracing::debug!(url = %self.url, "Relaying question");

        let response = request
            .send()
            .await
            .map_err(|e| EndpointError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                url = %self.url,
                status = status.as_u16(),
                body = %body,
                "Relay upstream returned an error"
            );
            return Err(EndpointError::upstream(status.as_u16(), body));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EndpointError::Transport(format!("Invalid relay response: {}", e)))?;

        extract_answer(&payload).ok_or(EndpointError::EmptyResponse)
    }
}

/// First non-empty string among [`ANSWER_KEYS`].
fn extract_answer(payload: &serde_json::Value) -> Option<String> {
    ANSWER_KEYS
        .iter()
        .filter_map(|key| payload.get(key).and_then(|v| v.as_str()))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Endpoint for DirectRelayEndpoint {
    async fn invoke(&self, conversation: &Conversation) -> Result<EventStream, EndpointError> {
        let answer = self.fetch_answer(conversation).await?;
        Ok(stream_text(answer, self.chunking))
    }

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor {
            kind: EndpointKind::DirectRelay,
            weight: self.weight,
            model: self.model.clone(),
        }
    }
}
