//! Recommendation pipeline behind the `getAllRecommendations` tool.
//!
//! Stage A asks the completion model for up to five ranked supplements.
//! Stage B fans out one task per supplement to find an educational video and
//! a catalog product. The results are assembled into labelled JSON blocks.
//!
//! Every failure degrades to "nothing for this item"; the pipeline itself
//! never fails.

use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;

use crate::adapters::video::RetryingVideoSearch;
use crate::domain::{
    assemble_sections, EducationalVideo, HealthProfile, NutraceuticalRecommendation,
    ProductRecommendation,
};
use crate::ports::{
    AIError, AIProvider, JsonSchemaFormat, MessageRole, ProductQuery, ProductStore,
    ResponseRequest,
};

/// Maximum number of supplements carried through Stage B.
pub const MAX_RECOMMENDATIONS: usize = 5;

const CONSULTANT_PROMPT: &str = "You are a knowledgeable supplement advisor. Based solely on the user's profile, and only recommending supplements appropriate for their gender, suggest the **five best** supplements, ranked most to least important. For each supplement list any other names it is commonly sold under as aliases. Respond strictly in JSON format.";

/// Orchestrates the consultant model, video search and product catalog.
#[derive(Clone)]
pub struct RecommendationPipeline {
    ai: Arc<dyn AIProvider>,
    model: String,
    videos: Arc<RetryingVideoSearch>,
    products: Arc<dyn ProductStore>,
}

/// What Stage B found for one supplement.
#[derive(Debug, Default)]
struct ItemFindings {
    video: Option<EducationalVideo>,
    product: Option<ProductRecommendation>,
}

#[derive(Debug, Deserialize)]
struct ConsultantAnswer {
    nutraceutical_recommendations: Vec<NutraceuticalRecommendation>,
}

impl RecommendationPipeline {
    pub fn new(
        ai: Arc<dyn AIProvider>,
        model: impl Into<String>,
        videos: Arc<RetryingVideoSearch>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            ai,
            model: model.into(),
            videos,
            products,
        }
    }

    /// Runs both stages and returns the assembled answer, or `""` when
    /// nothing was found.
    pub async fn run(&self, profile: &HealthProfile) -> String {
        let nutraceuticals = match self.recommend_nutraceuticals(profile).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Nutraceutical consultant failed");
                Vec::new()
            }
        };

        let findings = self.gather_findings(&nutraceuticals).await;

        let mut products = Vec::new();
        let mut videos = Vec::new();
        for found in findings {
            products.extend(found.product);
            videos.extend(found.video);
        }

        match assemble_sections(&products, &nutraceuticals, &videos) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to assemble recommendations");
                String::new()
            }
        }
    }

    /// Stage A: ranked supplements for the profile, at most five.
    async fn recommend_nutraceuticals(
        &self,
        profile: &HealthProfile,
    ) -> Result<Vec<NutraceuticalRecommendation>, AIError> {
        let request = ResponseRequest::new(&self.model)
            .with_message(MessageRole::System, CONSULTANT_PROMPT)
            .with_message(MessageRole::User, profile.to_prompt())
            .with_output_format(JsonSchemaFormat::new(
                "NutraceuticalResponseFormat",
                nutraceutical_schema(),
            ));

        let output = self.ai.respond(request).await?;
        let answer: ConsultantAnswer = serde_json::from_str(&output.text)
            .map_err(|e| AIError::parse(format!("Invalid consultant JSON: {}", e)))?;

        let mut items = answer.nutraceutical_recommendations;
        items.truncate(MAX_RECOMMENDATIONS);
        tracing::debug!(count = items.len(), "Nutraceutical recommendations received");
        Ok(items)
    }

    /// Stage B: one spawned task per supplement, results in input order.
    async fn gather_findings(&self, items: &[NutraceuticalRecommendation]) -> Vec<ItemFindings> {
        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|item| {
                let pipeline = self.clone();
                tokio::spawn(async move { pipeline.find_for(&item).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(items)
            .map(|(joined, item)| {
                joined.unwrap_or_else(|e| {
                    tracing::warn!(
                        nutraceutical = %item.nutraceutical_name,
                        error = %e,
                        "Recommendation task failed"
                    );
                    ItemFindings::default()
                })
            })
            .collect()
    }

    async fn find_for(&self, item: &NutraceuticalRecommendation) -> ItemFindings {
        let query = format!("{} supplement benefits", item.nutraceutical_name);
        let video = self.videos.find(&query).await.map(|hit| EducationalVideo {
            nutraceutical_name: item.nutraceutical_name.clone(),
            video_link: hit.watch_url(),
            video_title: hit.title,
        });

        let product = self.find_product(item).await;

        ItemFindings { video, product }
    }

    /// Tries the primary name, then each alias, until the catalog matches.
    async fn find_product(&self, item: &NutraceuticalRecommendation) -> Option<ProductRecommendation> {
        for name in item.lookup_names() {
            let mut query = ProductQuery::new(&name);
            if let Some(group) = item.preference_group() {
                query = query.in_group(group);
            }

            match self.products.find_first(&query).await {
                Ok(Some(product)) => {
                    tracing::debug!(lookup = %name, "Catalog product matched");
                    return Some(product.into());
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(lookup = %name, error = %e, "Product lookup failed");
                    return None;
                }
            }
        }
        None
    }
}

fn nutraceutical_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "nutraceutical_recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "nutraceutical_name": { "type": "string" },
                        "reason_for_recommendation": { "type": "string" },
                        "benefits": { "type": "string" },
                        "interactions_with_users_medications": { "type": "string" },
                        "best_time_to_take": { "type": "string" },
                        "user_gender": { "type": "string" },
                        "aliases": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": [
                        "nutraceutical_name",
                        "reason_for_recommendation",
                        "benefits",
                        "interactions_with_users_medications",
                        "best_time_to_take",
                        "user_gender",
                        "aliases"
                    ]
                }
            }
        },
        "required": ["nutraceutical_recommendations"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::products::InMemoryProductStore;
    use crate::adapters::video::{MockVideoSearch, RetryPolicy};
    use crate::domain::Product;
    use crate::ports::{InputItem, VideoHit};
    use std::time::Duration;

    fn consultant_json(names: &[&str]) -> String {
        let items: Vec<_> = names
            .iter()
            .map(|name| {
                json!({
                    "nutraceutical_name": name,
                    "reason_for_recommendation": "r",
                    "benefits": "b",
                    "interactions_with_users_medications": "none",
                    "best_time_to_take": "morning",
                    "user_gender": "Female",
                    "aliases": []
                })
            })
            .collect();
        json!({ "nutraceutical_recommendations": items }).to_string()
    }

    fn pipeline(
        ai: MockAIProvider,
        videos: MockVideoSearch,
        products: Vec<Product>,
    ) -> RecommendationPipeline {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1));
        RecommendationPipeline::new(
            Arc::new(ai),
            "gpt-4o",
            Arc::new(RetryingVideoSearch::new(Arc::new(videos), policy)),
            Arc::new(InMemoryProductStore::new(products)),
        )
    }

    #[tokio::test]
    async fn consultant_failure_yields_empty_answer() {
        let ai = MockAIProvider::new().with_error(AIError::unavailable("down"));
        let answer = pipeline(ai, MockVideoSearch::new(), vec![])
            .run(&HealthProfile::default())
            .await;

        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn truncates_to_five_items() {
        let ai = MockAIProvider::new()
            .with_response(consultant_json(&["A", "B", "C", "D", "E", "F", "G"]));
        let videos = MockVideoSearch::new();
        let p = pipeline(ai, videos.clone(), vec![]);

        let answer = p.run(&HealthProfile::default()).await;

        assert!(answer.starts_with("Nutraceutical Recommendations:\n```json\n"));
        assert!(!answer.contains("\"F\""));
        assert_eq!(videos.call_count(), 5);
    }

    #[tokio::test]
    async fn assembles_all_sections_in_item_order() {
        let ai = MockAIProvider::new().with_response(consultant_json(&["Magnesium", "Zinc"]));
        let videos = MockVideoSearch::new()
            .on_query(
                "Magnesium supplement benefits",
                Ok(Some(VideoHit::new("mg1", Some("Mg".to_string())))),
            )
            .on_query("Zinc supplement benefits", Ok(Some(VideoHit::new("zn1", None))));
        let products = vec![
            Product {
                product_name: Some("Zinc Picolinate".to_string()),
                gender: Some("All".to_string()),
                price: Some(9.5),
                ..Default::default()
            },
            Product {
                product_name: Some("Magnesium Glycinate".to_string()),
                gender: Some("Female".to_string()),
                ..Default::default()
            },
        ];

        let answer = pipeline(ai, videos, products)
            .run(&HealthProfile::default())
            .await;

        let products_at = answer.find("Product Recommendations:").unwrap();
        let nutra_at = answer.find("Nutraceutical Recommendations:").unwrap();
        let videos_at = answer.find("Educational Videos:").unwrap();
        assert!(products_at < nutra_at && nutra_at < videos_at);

        let mg = answer.find("Magnesium Glycinate").unwrap();
        let zn = answer.find("Zinc Picolinate").unwrap();
        assert!(mg < zn);
        assert!(answer.contains("\"price\":\"9.50\""));
        assert!(answer.contains("https://www.youtube.com/watch?v=mg1"));
        assert!(answer.contains("https://www.youtube.com/watch?v=zn1"));
    }

    #[tokio::test]
    async fn falls_back_to_alias_for_product_lookup() {
        let consultant = json!({
            "nutraceutical_recommendations": [{
                "nutraceutical_name": "Vitamin D3",
                "reason_for_recommendation": "r",
                "benefits": "b",
                "interactions_with_users_medications": "none",
                "best_time_to_take": "morning",
                "user_gender": "Male",
                "aliases": ["Cholecalciferol"]
            }]
        });
        let ai = MockAIProvider::new().with_response(consultant.to_string());
        let products = vec![Product {
            product_name: Some("Cholecalciferol 5000 IU".to_string()),
            gender: Some("All".to_string()),
            ..Default::default()
        }];

        let answer = pipeline(ai, MockVideoSearch::new(), products)
            .run(&HealthProfile::default())
            .await;

        assert!(answer.contains("Cholecalciferol 5000 IU"));
        assert!(!answer.contains("Educational Videos"));
    }

    #[tokio::test]
    async fn consultant_request_uses_schema_and_profile() {
        let ai = MockAIProvider::new().with_response(consultant_json(&[]));
        let p = pipeline(ai.clone(), MockVideoSearch::new(), vec![]);
        let profile = HealthProfile {
            primary_health_goal: "Better sleep".to_string(),
            ..Default::default()
        };

        assert_eq!(p.run(&profile).await, "");

        let calls = ai.get_calls();
        assert_eq!(calls.len(), 1);
        let format = calls[0].output_format.as_ref().unwrap();
        assert_eq!(format.name, "NutraceuticalResponseFormat");
        let prompt_mentions_goal = calls[0].input.iter().any(|item| {
            matches!(item, InputItem::Message(m) if m.role == MessageRole::User && m.content.contains("Better sleep"))
        });
        assert!(prompt_mentions_goal);
    }

    /// Catalog that panics for one name and delegates everything else.
    struct PanicsOn {
        name: &'static str,
        inner: InMemoryProductStore,
    }

    #[async_trait::async_trait]
    impl ProductStore for PanicsOn {
        async fn find_first(
            &self,
            query: &ProductQuery,
        ) -> Result<Option<Product>, crate::ports::ProductStoreError> {
            if query.name_fragment == self.name {
                panic!("catalog lookup crashed for {}", self.name);
            }
            self.inner.find_first(query).await
        }
    }

    #[tokio::test]
    async fn panicking_item_task_is_skipped() {
        let ai = MockAIProvider::new().with_response(consultant_json(&["Iron", "Zinc", "Biotin"]));
        let catalog = InMemoryProductStore::new(
            ["Iron Bisglycinate", "Zinc Picolinate", "Biotin 5000"]
                .iter()
                .map(|name| Product {
                    product_name: Some(name.to_string()),
                    gender: Some("All".to_string()),
                    ..Default::default()
                })
                .collect(),
        );
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1));
        let pipeline = RecommendationPipeline::new(
            Arc::new(ai),
            "gpt-4o",
            Arc::new(RetryingVideoSearch::new(
                Arc::new(MockVideoSearch::new()),
                policy,
            )),
            Arc::new(PanicsOn {
                name: "zinc",
                inner: catalog,
            }),
        );

        let answer = pipeline.run(&HealthProfile::default()).await;

        assert!(answer.contains("Iron Bisglycinate"));
        assert!(answer.contains("Biotin 5000"));
        assert!(!answer.contains("Zinc Picolinate"));
        // The nutraceutical list itself is unaffected.
        assert!(answer.contains(r#""nutraceutical_name":"Zinc""#));
    }
}
