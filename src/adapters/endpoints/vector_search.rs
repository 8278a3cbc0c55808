//! Search relay endpoint.
//!
//! Sends the latest message to the completion model with file search forced
//! over the configured vector store, and streams the product recommendations
//! back as a pretty-printed JSON code block.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{stream_text, ChunkingOptions, Conversation, EventStream};
use crate::ports::{
    AIError, AIProvider, Endpoint, EndpointDescriptor, EndpointError, EndpointKind,
    JsonSchemaFormat, MessageRole, ResponseRequest, ToolChoice, ToolSpec,
};

const CONSULTANT_PROMPT: &str = "You are a Product Consultant with access to a product catalog. Recommend suitable products based on the user's input. Respond strictly in JSON format.";

/// Product lookup over a hosted vector store.
pub struct VectorSearchEndpoint {
    ai: Arc<dyn AIProvider>,
    model: String,
    vector_store_id: String,
    weight: u32,
    chunking: ChunkingOptions,
}

impl VectorSearchEndpoint {
    pub fn new(
        ai: Arc<dyn AIProvider>,
        model: impl Into<String>,
        vector_store_id: impl Into<String>,
    ) -> Self {
        Self {
            ai,
            model: model.into(),
            vector_store_id: vector_store_id.into(),
            weight: 1,
            chunking: ChunkingOptions::json_friendly(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Overrides chunk size and pacing.
    pub fn with_chunking(mut self, chunking: ChunkingOptions) -> Self {
        self.chunking = chunking;
        self
    }

    async fn answer(&self, user_input: &str) -> Result<String, EndpointError> {
        let request = ResponseRequest::new(&self.model)
            .with_message(MessageRole::System, CONSULTANT_PROMPT)
            .with_message(MessageRole::User, user_input)
            .with_tool(ToolSpec::FileSearch {
                vector_store_ids: vec![self.vector_store_id.clone()],
            })
            .with_tool_choice(ToolChoice::FileSearch)
            .with_output_format(JsonSchemaFormat::new(
                "ProductResponseFormat",
                product_schema(),
            ));

        let output = self.ai.respond(request).await?;
        let products: serde_json::Value = serde_json::from_str(&output.text)
            .map_err(|e| AIError::parse(format!("Invalid product JSON: {}", e)))?;

        format_products(&products)
    }
}

/// Wraps the product JSON in a fenced block, pretty-printed.
fn format_products(products: &serde_json::Value) -> Result<String, EndpointError> {
    let pretty = serde_json::to_string_pretty(products)
        .map_err(|e| EndpointError::runtime(format!("Failed to format products: {}", e)))?;
    Ok(format!("```json\n{}\n```\n\n", pretty))
}

#[async_trait]
impl Endpoint for VectorSearchEndpoint {
    async fn invoke(&self, conversation: &Conversation) -> Result<EventStream, EndpointError> {
        let user_input = conversation
            .last_message()
            .map(|m| m.content.clone())
            .ok_or(EndpointError::EmptyConversation)?;

        match self.answer(&user_input).await {
            Ok(text) => Ok(stream_text(text, self.chunking)),
            Err(e) => {
                tracing::error!(
                    vector_store_id = %self.vector_store_id,
                    error = %e,
                    "Product search failed"
                );
                Ok(stream_text(e.user_message(), ChunkingOptions::immediate(usize::MAX)))
            }
        }
    }

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor {
            kind: EndpointKind::VectorSearch,
            weight: self.weight,
            model: Some(self.model.clone()),
        }
    }
}

fn product_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "product_recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "product_name": { "type": "string", "description": "The name of the product" },
                        "image": { "type": "string", "description": "The image URL of the product" },
                        "description": { "type": "string", "description": "The description of the product" },
                        "price": { "type": "string", "description": "The price of the product" },
                        "product_link": { "type": "string", "description": "The link to the product" }
                    },
                    "required": ["product_name", "image", "description", "price", "product_link"]
                }
            }
        },
        "required": ["product_recommendations"]
    })
}
