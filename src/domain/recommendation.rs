//! Recommendation records and the formatting of the assembled answer.
//!
//! These are pass-through records: produced by the completion API or the
//! product catalog, lightly reshaped, and serialized back into the answer.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Catalog group matching every preference group.
pub const WILDCARD_GROUP: &str = "All";

/// Normalizes a supplement or product name for catalog matching.
///
/// Lowercases, drops everything outside `[a-z0-9 ]`, collapses whitespace
/// runs to a single space and trims the ends.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_NAME_CHARS.replace_all(&lowered, "");
    SPACE_RUNS.replace_all(&stripped, " ").trim().to_string()
}

/// Health information the model collects before calling the recommendation tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    pub primary_health_goal: String,
    pub secondary_health_goal: String,
    pub gender: String,
    pub age: f64,
    pub height: String,
    pub weight: String,
    #[serde(default)]
    pub allergies_intolerances: Vec<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl HealthProfile {
    /// Renders the profile as the consultant prompt body.
    pub fn to_prompt(&self) -> String {
        format!(
            "HEALTH GOALS\n\
             Primary Health Goal= {}\n\
             Secondary Health Goal= {}\n\
             \n\
             GENERAL INFORMATION\n\
             Gender= {}\n\
             Age= {}\n\
             Height= {}\n\
             Weight= {} lb\n\
             \n\
             MEDICAL AND HEALTH CONDITIONS\n\
             Allergies/Intolerances= {}\n\
             Existing Health Conditions= {}\n\
             Symptoms Experienced= {}\n\
             Current Medications= {}\n\
             \n\
             ADDITIONAL INFORMATION\n\
             {}",
            self.primary_health_goal,
            self.secondary_health_goal,
            self.gender,
            self.age,
            self.height,
            self.weight,
            format_list(&self.allergies_intolerances),
            format_list(&self.health_conditions),
            format_list(&self.symptoms),
            or_none(&self.medications),
            or_none(self.additional_info.as_deref().unwrap_or_default()),
        )
    }
}

/// `None` when the list holds the "None" answer, otherwise the comma-joined items.
fn format_list(items: &[String]) -> String {
    if items.iter().any(|item| item == "None") {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "None"
    } else {
        value
    }
}

/// A ranked supplement suggestion from the consultant model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutraceuticalRecommendation {
    pub nutraceutical_name: String,
    pub reason_for_recommendation: String,
    pub benefits: String,
    pub interactions_with_users_medications: String,
    pub best_time_to_take: String,
    /// Preference group used to filter catalog products.
    pub user_gender: String,
    /// Other names the supplement is sold under.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl NutraceuticalRecommendation {
    /// Normalized primary name followed by normalized aliases, without
    /// blanks or duplicates.
    pub fn lookup_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let candidates = std::iter::once(&self.nutraceutical_name).chain(self.aliases.iter());

        for name in candidates.map(|n| normalize_name(n)) {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }

        names
    }

    /// Preference group for catalog filtering, if one was given.
    pub fn preference_group(&self) -> Option<&str> {
        let group = self.user_gender.trim();
        (!group.is_empty()).then_some(group)
    }
}

/// An educational video for a recommended supplement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationalVideo {
    pub nutraceutical_name: String,
    pub video_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,
}

/// A purchasable product shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    pub product_name: String,
    pub image: String,
    pub description: String,
    pub price: String,
    pub product_link: String,
}

/// A product record as stored in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Preference group the product is sold to, or [`WILDCARD_GROUP`].
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub normalized_product_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Normalized name used for matching, derived from the product name when
    /// the catalog did not store one.
    pub fn match_name(&self) -> String {
        match (&self.normalized_product_name, &self.product_name) {
            (Some(normalized), _) if !normalized.is_empty() => normalized.clone(),
            (_, Some(name)) => normalize_name(name),
            _ => String::new(),
        }
    }
}

impl From<Product> for ProductRecommendation {
    fn from(product: Product) -> Self {
        Self {
            product_name: product.product_name.unwrap_or_default(),
            image: product.image_url.unwrap_or_default(),
            description: product.description.unwrap_or_default(),
            price: product.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            product_link: product.product_url.unwrap_or_default(),
        }
    }
}

/// Builds the labelled JSON code-block answer for the recommendation tool.
///
/// Sections appear in the order products, nutraceuticals, videos; empty
/// sections are omitted and an empty string means nothing was found.
pub fn assemble_sections(
    products: &[ProductRecommendation],
    nutraceuticals: &[NutraceuticalRecommendation],
    videos: &[EducationalVideo],
) -> Result<String, serde_json::Error> {
    let mut answer = String::new();

    if !products.is_empty() {
        push_section(
            &mut answer,
            "Product Recommendations",
            &serde_json::json!({ "product_recommendations": products }),
        )?;
    }

    if !nutraceuticals.is_empty() {
        push_section(
            &mut answer,
            "Nutraceutical Recommendations",
            &serde_json::json!({ "nutraceutical_recommendations": nutraceuticals }),
        )?;
    }

    if !videos.is_empty() {
        push_section(
            &mut answer,
            "Educational Videos",
            &serde_json::json!({ "educational_videos": videos }),
        )?;
    }

    Ok(answer)
}

fn push_section(
    answer: &mut String,
    label: &str,
    body: &serde_json::Value,
) -> Result<(), serde_json::Error> {
    answer.push_str(label);
    answer.push_str(":\n```json\n");
    answer.push_str(&serde_json::to_string(body)?);
    answer.push_str("\n```\n\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nutraceutical(name: &str) -> NutraceuticalRecommendation {
        NutraceuticalRecommendation {
            nutraceutical_name: name.to_string(),
            user_gender: "Female".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_name("Vitamin-D3!!"), "vitamind3");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_name("  Omega   3  "), "omega 3");
        assert_eq!(normalize_name("Fish Oil (EPA/DHA)"), "fish oil epadha");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn lookup_names_put_primary_first_and_skip_duplicates() {
        let item = NutraceuticalRecommendation {
            nutraceutical_name: "Vitamin D3".to_string(),
            aliases: vec![
                "vitamin d3".to_string(),
                "Cholecalciferol".to_string(),
                "!!".to_string(),
            ],
            ..Default::default()
        };

        assert_eq!(item.lookup_names(), vec!["vitamin d3", "cholecalciferol"]);
    }

    #[test]
    fn preference_group_ignores_blank() {
        let mut item = nutraceutical("Zinc");
        assert_eq!(item.preference_group(), Some("Female"));
        item.user_gender = "  ".to_string();
        assert_eq!(item.preference_group(), None);
    }

    #[test]
    fn product_reshapes_into_recommendation() {
        let product = Product {
            product_name: Some("Sunny D3".to_string()),
            image_url: Some("https://img/d3.png".to_string()),
            product_url: Some("https://shop/d3".to_string()),
            description: Some("Daily vitamin D".to_string()),
            price: Some(12.5),
            ..Default::default()
        };

        let rec = ProductRecommendation::from(product);
        assert_eq!(rec.product_name, "Sunny D3");
        assert_eq!(rec.image, "https://img/d3.png");
        assert_eq!(rec.product_link, "https://shop/d3");
        assert_eq!(rec.price, "12.50");
    }

    #[test]
    fn match_name_falls_back_to_product_name() {
        let product = Product {
            product_name: Some("Omega-3 Fish Oil".to_string()),
            ..Default::default()
        };
        assert_eq!(product.match_name(), "omega3 fish oil");

        let stored = Product {
            normalized_product_name: Some("omega 3".to_string()),
            product_name: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(stored.match_name(), "omega 3");
    }

    #[test]
    fn assemble_orders_sections_and_skips_empty() {
        let products = vec![ProductRecommendation {
            product_name: "P".to_string(),
            ..Default::default()
        }];
        let nutraceuticals = vec![nutraceutical("Zinc")];

        let answer = assemble_sections(&products, &nutraceuticals, &[]).unwrap();

        let product_at = answer.find("Product Recommendations:\n```json\n").unwrap();
        let nutra_at = answer.find("Nutraceutical Recommendations:\n```json\n").unwrap();
        assert!(product_at < nutra_at);
        assert!(!answer.contains("Educational Videos"));
        assert!(answer.ends_with("\n```\n\n"));
        assert!(answer.contains(r#"{"product_recommendations":[{"product_name":"P""#));
    }

    #[test]
    fn assemble_empty_is_empty_string() {
        assert_eq!(assemble_sections(&[], &[], &[]).unwrap(), "");
    }

    #[test]
    fn health_profile_prompt_formats_lists() {
        let profile = HealthProfile {
            primary_health_goal: "Better sleep".to_string(),
            secondary_health_goal: "Improved energy".to_string(),
            gender: "Female".to_string(),
            age: 34.0,
            height: "5'6\"".to_string(),
            weight: "130-140".to_string(),
            allergies_intolerances: vec!["None".to_string()],
            health_conditions: vec!["Asthma".to_string(), "Anemia".to_string()],
            symptoms: vec![],
            medications: String::new(),
            additional_info: None,
        };

        let prompt = profile.to_prompt();
        assert!(prompt.contains("Primary Health Goal= Better sleep"));
        assert!(prompt.contains("Age= 34"));
        assert!(prompt.contains("Weight= 130-140 lb"));
        assert!(prompt.contains("Allergies/Intolerances= None"));
        assert!(prompt.contains("Existing Health Conditions= Asthma, Anemia"));
        assert!(prompt.contains("Symptoms Experienced= \nCurrent Medications="));
        assert!(prompt.contains("Current Medications= None"));
        assert!(prompt.ends_with("ADDITIONAL INFORMATION\nNone"));
    }

    #[test]
    fn health_profile_parses_tool_arguments() {
        let args = r#"{
            "primaryHealthGoal": "Muscle gain",
            "secondaryHealthGoal": "Healthy aging",
            "gender": "Male",
            "age": 41,
            "height": "6ft",
            "weight": "180-190",
            "allergiesIntolerances": [],
            "healthConditions": ["None"],
            "symptoms": ["Fatigue"],
            "medications": "Metformin",
            "additionalInfo": "Vegetarian"
        }"#;

        let profile: HealthProfile = serde_json::from_str(args).unwrap();
        assert_eq!(profile.gender, "Male");
        assert_eq!(profile.age, 41.0);
        assert_eq!(profile.additional_info.as_deref(), Some("Vegetarian"));
    }
}
