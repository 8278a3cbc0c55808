//! Endpoint Adapters.
//!
//! - `DirectRelayEndpoint` - relays to an external chat-flow service
//! - `SupplementFlowEndpoint` - advisor model with the recommendation tool
//! - `VectorSearchEndpoint` - file-search product lookup
//!
//! `EndpointFactory` builds them from validated configuration, sharing one
//! HTTP client, one video search and one product store.

mod direct_relay;
mod supplement_flow;
mod vector_search;

pub use direct_relay::{DirectRelayEndpoint, ANSWER_KEYS};
pub use supplement_flow::{SupplementFlowEndpoint, CONTEXT_WINDOW, RECOMMENDATIONS_TOOL};
pub use vector_search::VectorSearchEndpoint;

use std::sync::Arc;

use reqwest::Client;

use crate::adapters::ai::{OpenAIConfig, OpenAIProvider};
use crate::adapters::video::RetryingVideoSearch;
use crate::application::RecommendationPipeline;
use crate::config::{checked_weight, AiConfig, CompletionEndpointConfig, ConfigError, EndpointConfig};
use crate::ports::{AIProvider, Endpoint, ProductStore};

/// Builds endpoints from configuration.
#[derive(Clone)]
pub struct EndpointFactory {
    client: Client,
    ai: AiConfig,
    videos: Arc<RetryingVideoSearch>,
    products: Arc<dyn ProductStore>,
}

impl EndpointFactory {
    pub fn new(
        client: Client,
        ai: AiConfig,
        videos: Arc<RetryingVideoSearch>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            client,
            ai,
            videos,
            products,
        }
    }

    /// Validates `config` and constructs the endpoint named `name`.
    pub fn build(&self, name: &str, config: &EndpointConfig) -> Result<Arc<dyn Endpoint>, ConfigError> {
        config.validate(name)?;
        let weight = checked_weight(name, config.weight())?;

        let endpoint: Arc<dyn Endpoint> = match config {
            EndpointConfig::Custom(relay) => {
                let mut endpoint =
                    DirectRelayEndpoint::new(self.client.clone(), &relay.url).with_weight(weight);
                if let Some(key) = &relay.api_key {
                    endpoint = endpoint.with_api_key(key.clone());
                }
                if let Some(model) = &relay.model {
                    endpoint = endpoint.with_model(model);
                }
                Arc::new(endpoint)
            }
            EndpointConfig::SupplementFlow(completion) => {
                let (ai, model) = self.provider(completion);
                let pipeline = RecommendationPipeline::new(
                    ai.clone(),
                    &model,
                    self.videos.clone(),
                    self.products.clone(),
                );
                Arc::new(SupplementFlowEndpoint::new(ai, model, pipeline).with_weight(weight))
            }
            EndpointConfig::SupplementVectorSearch(completion) => {
                let (ai, model) = self.provider(completion);
                Arc::new(
                    VectorSearchEndpoint::new(ai, model, &completion.vector_store_id)
                        .with_weight(weight),
                )
            }
        };

        tracing::info!(
            endpoint = name,
            kind = ?endpoint.descriptor().kind,
            weight,
            "Endpoint configured"
        );
        Ok(endpoint)
    }

    fn provider(&self, completion: &CompletionEndpointConfig) -> (Arc<dyn AIProvider>, String) {
        let model = completion
            .model
            .clone()
            .unwrap_or_else(|| self.ai.default_model.clone());
        let config = OpenAIConfig::from_secret(completion.openai_api_key.clone())
            .with_model(&model)
            .with_base_url(&self.ai.base_url)
            .with_timeout(self.ai.timeout())
            .with_max_retries(self.ai.max_retries);

        (
            Arc::new(OpenAIProvider::with_client(config, self.client.clone())),
            model,
        )
    }
}
