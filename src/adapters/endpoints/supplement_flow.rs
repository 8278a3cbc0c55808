//! Supplement flow endpoint.
//!
//! A health-advisor conversation backed by the completion model. The model
//! can call `getAllRecommendations` with the user's profile; the call runs the
//! recommendation pipeline and the model's second answer is streamed. Any
//! failure is streamed back as an apology instead of an error.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::RecommendationPipeline;
use crate::domain::{
    stream_text, Author, ChunkingOptions, Conversation, EventStream, HealthProfile,
};
use crate::ports::{
    AIProvider, Endpoint, EndpointDescriptor, EndpointError, EndpointKind, FunctionDefinition,
    InputItem, Message, ResponseRequest, ToolSpec,
};

/// Name of the recommendation tool offered to the model.
pub const RECOMMENDATIONS_TOOL: &str = "getAllRecommendations";

/// Number of most recent messages sent to the model.
pub const CONTEXT_WINDOW: usize = 20;

const NO_RECOMMENDATIONS: &str =
    "No recommendations could be found for this profile. Ask the user for more details about their health goals.";

const ADVISOR_PROMPT: &str = r#"
You are a knowledgeable health advisor. Your job is to assist users in discovering health supplements tailored to their goals and preferences.

#Flow:
Accept the user's input on their health goals, concerns, or symptoms.
Assess whether enough information is provided to recommend supplements:
- If yes, call the getAllRecommendations tool with the user's details.
- If no, ask polite follow-up questions to collect the needed info.

#IMPORTANT Response Rule After Tool Call:
When you receive the tool output from getAllRecommendations, you MUST DO THE FOLLOWING:
- Prefix the output with the friendly line.
- Then immediately follow it with the raw output received from tool getAllRecommendations inside a code block.
    Example: { ...exact JSON output received from getAllRecommendations tool... }
    Note: Do not add any other text or formatting to the output from the getAllRecommendations tool.

#Close your message with a thoughtful question to help users achieve their health goals.

#Maintain a warm, supportive tone throughout the interaction, but strictly follow the format and output instructions above.
"#;

/// Tool-orchestrated supplement advisor.
pub struct SupplementFlowEndpoint {
    ai: Arc<dyn AIProvider>,
    model: String,
    pipeline: RecommendationPipeline,
    weight: u32,
    chunking: ChunkingOptions,
}

impl SupplementFlowEndpoint {
    pub fn new(
        ai: Arc<dyn AIProvider>,
        model: impl Into<String>,
        pipeline: RecommendationPipeline,
    ) -> Self {
        Self {
            ai,
            model: model.into(),
            pipeline,
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

    fn base_request(&self, input: Vec<InputItem>) -> ResponseRequest {
        ResponseRequest::new(&self.model)
            .with_input(input)
            .with_tool(recommendations_tool())
    }

    async fn answer(&self, conversation: &Conversation) -> Result<String, EndpointError> {
        let mut input = vec![InputItem::Message(Message::system(ADVISOR_PROMPT))];
        input.extend(conversation.recent(CONTEXT_WINDOW).iter().map(|m| {
            InputItem::Message(match m.author {
                Author::User => Message::user(&m.content),
                Author::Assistant => Message::assistant(&m.content),
            })
        }));

        let first = self.ai.respond(self.base_request(input.clone())).await?;

        let mut tool_used = false;
        for call in first.calls_to(RECOMMENDATIONS_TOOL) {
            let profile: HealthProfile = serde_json::from_str(&call.arguments).map_err(|e| {
                EndpointError::tool_execution(format!(
                    "invalid {} arguments: {}",
                    RECOMMENDATIONS_TOOL, e
                ))
            })?;

            tracing::info!(call_id = %call.call_id, "Running recommendation tool");
            let mut output = self.pipeline.run(&profile).await;
            if output.is_empty() {
                output = NO_RECOMMENDATIONS.to_string();
            }

            input.push(InputItem::FunctionCall(call.clone()));
            input.push(InputItem::FunctionCallOutput {
                call_id: call.call_id.clone(),
                output,
            });
            tool_used = true;
        }

        if !tool_used {
            return Ok(first.text);
        }

        let second = self.ai.respond(self.base_request(input)).await?;
        Ok(second.text)
    }
}

#[async_trait]
impl Endpoint for SupplementFlowEndpoint {
    async fn invoke(&self, conversation: &Conversation) -> Result<EventStream, EndpointError> {
        if conversation.is_empty() {
            return Err(EndpointError::EmptyConversation);
        }

        match self.answer(conversation).await {
            Ok(text) => Ok(stream_text(text, self.chunking)),
            Err(e) => {
                tracing::error!(error = %e, "Supplement flow failed");
                Ok(stream_text(e.user_message(), ChunkingOptions::immediate(usize::MAX)))
            }
        }
    }

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor {
            kind: EndpointKind::SupplementFlow,
            weight: self.weight,
            model: Some(self.model.clone()),
        }
    }
}

fn recommendations_tool() -> ToolSpec {
    let goals = json!([
        "Weight loss",
        "Muscle gain",
        "Improved energy",
        "Boosted immunity",
        "Better sleep",
        "Enhanced focus and mental clarity",
        "Healthy aging"
    ]);
    let string_list = |description: &str| {
        json!({ "type": "array", "description": description, "items": { "type": "string" } })
    };

    ToolSpec::Function(FunctionDefinition::new(
        RECOMMENDATIONS_TOOL,
        "Provides nutraceuticals, products and educational videos recommendations as per user's profile.",
        json!({
            "type": "object",
            "properties": {
                "primaryHealthGoal": {
                    "type": "string",
                    "description": "The user's main health goal",
                    "enum": goals
                },
                "secondaryHealthGoal": {
                    "type": "string",
                    "description": "The user's secondary health goal",
                    "enum": goals
                },
                "gender": {
                    "type": "string",
                    "description": "The user's gender",
                    "enum": ["Male", "Female", "Non-binary", "Prefer not to say"]
                },
                "age": { "type": "number", "description": "The user's age" },
                "height": { "type": "string", "description": "The user's height" },
                "weight": { "type": "string", "description": "The user's weight range in pounds" },
                "allergiesIntolerances": string_list("List of user's allergies and intolerances"),
                "healthConditions": string_list("List of user's health conditions"),
                "symptoms": string_list("List of symptoms the user experiences"),
                "medications": {
                    "type": "string",
                    "description": "Medications the user is currently taking"
                },
                "additionalInfo": {
                    "type": "string",
                    "description": "Any additional information provided by the user"
                }
            },
            "required": [
                "primaryHealthGoal",
                "secondaryHealthGoal",
                "gender",
                "age",
                "height",
                "weight",
                "allergiesIntolerances",
                "healthConditions",
                "symptoms",
                "medications",
                "additionalInfo"
            ],
            "additionalProperties": false
        }),
    ))
}
