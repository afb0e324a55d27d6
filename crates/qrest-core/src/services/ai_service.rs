// ============================================================================
// QRest Core - AI Service
// File: crates/qrest-core/src/services/ai_service.rs
// Description: Credit-metered content generation through the language model port
// ============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{credit_cost, AiGeneratedContent, ContentType, CreditFeature, Role};
use crate::error::DomainError;
use crate::ports::{AiProvider, CompletionRequest, ModelTier};
use crate::repositories::{AiContentRepository, MenuRepository};
use crate::services::context::Actor;
use crate::services::credit_service::CreditService;

/// Display name for a language code, English when unknown.
pub fn language_name(code: &str) -> &'static str {
    match code {
        "tr" => "Turkish",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        _ => "English",
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_items_per_category() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDescription {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub item_name: String,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranslateItem {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(equal = 2, message = "Language must be a 2-letter code"))]
    pub from_language: String,
    #[validate(length(equal = 2, message = "Language must be a 2-letter code"))]
    pub to_language: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMenu {
    #[validate(length(min = 1, max = 200, message = "Restaurant name is required"))]
    pub restaurant_name: String,
    #[validate(length(min = 1, max = 100, message = "Cuisine type is required"))]
    pub cuisine_type: String,
    #[validate(length(min = 1, message = "At least one category is required"))]
    pub categories: Vec<String>,
    #[serde(default = "default_items_per_category")]
    #[validate(range(min = 1, max = 10, message = "Items per category must be between 1 and 10"))]
    pub items_per_category: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagePrompt {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub cuisine_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeDescription {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Current description is required"))]
    pub current_description: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeMenu {
    pub menu_id: Uuid,
}

/// Generated payload plus the accounting for the call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGeneration {
    #[serde(flatten)]
    pub output: Value,
    pub credits_used: i32,
    pub tokens_used: i64,
    pub remaining_credits: i32,
}

struct Job {
    feature: CreditFeature,
    content_type: ContentType,
    estimated_tokens: i64,
    request: CompletionRequest,
    history_prompt: String,
    metadata: Value,
    /// Response key in the returned payload.
    output_key: &'static str,
    parse_json: bool,
}

pub struct AiService {
    provider: Arc<dyn AiProvider>,
    credits: Arc<CreditService>,
    contents: Arc<dyn AiContentRepository>,
    menus: Arc<dyn MenuRepository>,
}

impl AiService {
    pub fn new(
        provider: Arc<dyn AiProvider>,
        credits: Arc<CreditService>,
        contents: Arc<dyn AiContentRepository>,
        menus: Arc<dyn MenuRepository>,
    ) -> Self {
        Self {
            provider,
            credits,
            contents,
            menus,
        }
    }

    pub async fn generate_description(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: GenerateDescription,
    ) -> Result<AiGeneration, DomainError> {
        input.validate()?;
        let language = language_name(&input.language);

        let mut prompt = format!(
            "You are a professional menu writer for a restaurant. Write an appetizing description for this menu item.\n\nItem Name: {}\n",
            input.item_name
        );
        if let Some(category) = &input.category {
            prompt.push_str(&format!("Category: {}\n", category));
        }
        if let Some(cuisine) = &input.cuisine {
            prompt.push_str(&format!("Cuisine Type: {}\n", cuisine));
        }
        prompt.push_str(&format!(
            "Language: {language}\n\nRequirements:\n- 2-3 sentences, at most 100 words\n- Highlight key ingredients or the preparation method\n- Use professional restaurant language\n- Write in {language}\n\nDescription:"
        ));

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::Description,
                content_type: ContentType::Description,
                estimated_tokens: 200,
                request: request(prompt, ModelTier::Default, 150, 0.7),
                history_prompt: format!("Generate description for: {}", input.item_name),
                metadata: json!({ "itemName": input.item_name }),
                output_key: "description",
                parse_json: false,
            },
        )
        .await
    }

    pub async fn translate_item(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: TranslateItem,
    ) -> Result<AiGeneration, DomainError> {
        input.validate()?;
        let prompt = format!(
            "Translate the following menu item from {} to {}.\n\nName: {}\nDescription: {}\n\nRequirements:\n- Keep culinary terminology accurate\n- Keep the appetizing tone\n- Make sure the result is culturally appropriate\n\nTranslated Name:\nTranslated Description:",
            language_name(&input.from_language),
            language_name(&input.to_language),
            input.item_name,
            input.description
        );

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::Translation,
                content_type: ContentType::Translation,
                estimated_tokens: 300,
                request: request(prompt, ModelTier::Default, 200, 0.3),
                history_prompt: format!(
                    "Translate {} from {} to {}",
                    input.item_name, input.from_language, input.to_language
                ),
                metadata: json!({
                    "itemName": input.item_name,
                    "fromLanguage": input.from_language,
                    "toLanguage": input.to_language,
                }),
                output_key: "translation",
                parse_json: false,
            },
        )
        .await
    }

    pub async fn generate_menu(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: GenerateMenu,
    ) -> Result<AiGeneration, DomainError> {
        input.validate()?;
        let language = language_name(&input.language);
        let count = input.items_per_category;

        let prompt = format!(
            r#"You are a professional menu designer. Create a complete menu for this restaurant.

Restaurant Name: {name}
Cuisine Type: {cuisine}
Categories: {categories}
Items per category: {count}
Language: {language}

Requirements:
- Generate {count} items for each category
- Give every item a name, a 2-3 sentence description and a suggested price
- Keep descriptions appetizing and authentic to the cuisine
- Vary the items within each category
- Write everything in {language}

Respond with JSON in this shape:
{{
  "categories": [
    {{
      "name": "category name",
      "description": "category description",
      "items": [
        {{ "name": "item name", "description": "item description", "suggestedPrice": 0 }}
      ]
    }}
  ]
}}"#,
            name = input.restaurant_name,
            cuisine = input.cuisine_type,
            categories = input.categories.join(", "),
        );

        let mut req = request(prompt, ModelTier::Advanced, 2000, 0.8);
        req.json_response = true;

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::MenuGen,
                content_type: ContentType::Menu,
                estimated_tokens: 2000,
                request: req,
                history_prompt: format!(
                    "Generate menu for {} ({})",
                    input.restaurant_name, input.cuisine_type
                ),
                metadata: json!({
                    "restaurantName": input.restaurant_name,
                    "cuisineType": input.cuisine_type,
                    "categoriesCount": input.categories.len(),
                }),
                output_key: "menu",
                parse_json: true,
            },
        )
        .await
    }

    pub async fn generate_image_prompt(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: GenerateImagePrompt,
    ) -> Result<AiGeneration, DomainError> {
        input.validate()?;
        let mut prompt = format!(
            "Write a detailed image generation prompt for this menu item, suitable for an image model.\n\nItem Name: {}\nDescription: {}\n",
            input.item_name, input.description
        );
        if let Some(cuisine) = &input.cuisine_type {
            prompt.push_str(&format!("Cuisine: {}\n", cuisine));
        }
        prompt.push_str(
            "\nRequirements:\n- Vivid food photography prompt\n- Cover plating, presentation and lighting\n- Professional food photography style\n- At most 100 words\n\nImage Prompt:",
        );

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::ImagePrompt,
                content_type: ContentType::Prompt,
                estimated_tokens: 200,
                request: request(prompt, ModelTier::Default, 150, 0.8),
                history_prompt: format!("Generate image prompt for: {}", input.item_name),
                metadata: json!({ "itemName": input.item_name }),
                output_key: "imagePrompt",
                parse_json: false,
            },
        )
        .await
    }

    pub async fn optimize_description(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: OptimizeDescription,
    ) -> Result<AiGeneration, DomainError> {
        input.validate()?;
        let prompt = format!(
            "You are a professional menu copywriter. Improve this menu item description so it reads more appetizing and professional.\n\nItem Name: {}\nCurrent Description: {}\nLanguage: {}\n\nRequirements:\n- More descriptive and appetizing\n- Highlight the key selling points\n- 2-3 sentences, at most 100 words\n- Keep the same language\n\nImproved Description:",
            input.item_name,
            input.current_description,
            language_name(&input.language)
        );

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::Optimization,
                content_type: ContentType::Description,
                estimated_tokens: 250,
                request: request(prompt, ModelTier::Default, 150, 0.7),
                history_prompt: format!("Optimize description for: {}", input.item_name),
                metadata: json!({ "itemName": input.item_name }),
                output_key: "optimizedDescription",
                parse_json: false,
            },
        )
        .await
    }

    pub async fn analyze_menu(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: AnalyzeMenu,
    ) -> Result<AiGeneration, DomainError> {
        let menu = match self.menus.find_by_id(&input.menu_id).await? {
            Some(menu) if &menu.org_id == org_id => menu,
            _ => return Err(DomainError::NotFound("Menu")),
        };
        let categories = self.menus.load_categories(&menu.id, false).await?;

        let menu_data = json!({
            "categories": categories.iter().map(|c| json!({
                "name": c.category.name,
                "items": c.items.iter().map(|i| json!({
                    "name": i.name,
                    "description": i.description,
                    "price": i.price,
                })).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        });
        let rendered = serde_json::to_string_pretty(&menu_data)
            .map_err(|e| DomainError::InternalError(e.to_string()))?;
        let prompt = format!(
            "You are a restaurant consultant. Analyze this menu and suggest improvements.\n\n{}\n\nCover:\n1. Menu structure and balance\n2. Pricing strategy\n3. Description quality\n4. Missing opportunities\n5. Recommendations\n\nAnalysis:",
            rendered
        );

        self.run(
            actor,
            org_id,
            Job {
                feature: CreditFeature::MenuAnalysis,
                content_type: ContentType::Analysis,
                estimated_tokens: 1000,
                request: request(prompt, ModelTier::Advanced, 800, 0.6),
                history_prompt: format!("Analyze menu: {}", menu.name),
                metadata: json!({ "menuId": menu.id, "menuName": menu.name }),
                output_key: "analysis",
                parse_json: false,
            },
        )
        .await
    }

    /// Estimate check, provider call, actual-cost deduction, history row.
    async fn run(&self, actor: &Actor, org_id: &Uuid, job: Job) -> Result<AiGeneration, DomainError> {
        actor.require_org(org_id)?;
        actor.require_role(Role::Editor)?;

        let estimated = credit_cost(job.estimated_tokens);
        let balance = self.credits.ensure_available(org_id, estimated).await?;

        let completion = self.provider.complete(job.request).await.map_err(|e| {
            error!("{} generation failed for org {}: {}", job.feature.as_str(), org_id, e);
            e
        })?;

        let payload = if job.parse_json {
            serde_json::from_str::<Value>(&completion.content).map_err(|e| {
                DomainError::AiProviderError(format!("Model returned invalid JSON: {}", e))
            })?
        } else {
            Value::String(completion.content.clone())
        };

        let credits_used = credit_cost(completion.tokens_used);
        let remaining_credits = if credits_used > 0 {
            let mut metadata = job.metadata;
            if let Value::Object(map) = &mut metadata {
                map.insert("tokensUsed".into(), json!(completion.tokens_used));
                map.insert("model".into(), json!(completion.model));
            }
            self.credits
                .deduct(org_id, Some(actor.user_id), credits_used, job.feature, Some(metadata))
                .await?
        } else {
            balance
        };

        self.contents
            .create(&AiGeneratedContent::new(
                *org_id,
                actor.user_id,
                job.content_type,
                job.history_prompt,
                completion.content,
                i32::try_from(completion.tokens_used).unwrap_or(i32::MAX),
            ))
            .await?;

        info!(
            "{} generated for org {}: {} tokens, {} credits",
            job.feature.as_str(),
            org_id,
            completion.tokens_used,
            credits_used
        );

        let mut output = serde_json::Map::new();
        output.insert(job.output_key.to_string(), payload);

        Ok(AiGeneration {
            output: Value::Object(output),
            credits_used,
            tokens_used: completion.tokens_used,
            remaining_credits,
        })
    }
}

fn request(prompt: String, tier: ModelTier, max_tokens: u32, temperature: f32) -> CompletionRequest {
    CompletionRequest {
        prompt,
        tier,
        max_tokens,
        temperature,
        json_response: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Organization;
    use crate::ports::{Completion, MockAiProvider};
    use crate::repositories::{
        MockAiContentRepository, MockCreditPackageRepository, MockCreditRepository,
        MockMenuRepository, MockOrganizationRepository, MockSubscriptionPlanRepository,
    };

    fn credits(balance: i32, credits: MockCreditRepository) -> Arc<CreditService> {
        let mut org = Organization::new("Cafe", "cafe").unwrap();
        org.ai_credits = balance;
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        Arc::new(CreditService::new(
            Arc::new(organizations),
            Arc::new(credits),
            Arc::new(MockSubscriptionPlanRepository::new()),
            Arc::new(MockCreditPackageRepository::new()),
            Arc::new(MockAiContentRepository::new()),
        ))
    }

    fn completion(content: &str, tokens: i64) -> Completion {
        Completion {
            content: content.into(),
            tokens_used: tokens,
            model: "test-model".into(),
        }
    }

    fn description_input() -> GenerateDescription {
        GenerateDescription {
            item_name: "Margherita".into(),
            category: Some("Pizza".into()),
            cuisine: None,
            language: "tr".into(),
        }
    }

    #[test]
    fn test_language_name_fallback() {
        assert_eq!(language_name("de"), "German");
        assert_eq!(language_name("xx"), "English");
    }

    #[tokio::test]
    async fn test_generate_description_charges_actual_cost() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let mut provider = MockAiProvider::new();
        provider.expect_complete()
            .withf(|req| {
                req.tier == ModelTier::Default
                    && req.max_tokens == 150
                    && req.prompt.contains("Turkish")
                    && req.prompt.contains("Category: Pizza")
            })
            .returning(|_| Ok(completion("Crispy and fresh.", 1200)));
        let mut ledger = MockCreditRepository::new();
        ledger.expect_deduct()
            .withf(|_, _, amount, feature, metadata| {
                *amount == 2
                    && feature == "DESCRIPTION"
                    && metadata.as_ref().map_or(false, |m| m["tokensUsed"] == 1200)
            })
            .returning(|_, _, _, _, _| Ok(Some(48)));
        let mut contents = MockAiContentRepository::new();
        contents.expect_create()
            .withf(|c| c.content_type == ContentType::Description && c.tokens_used == 1200)
            .returning(|c| Ok(c.clone()));

        let service = AiService::new(
            Arc::new(provider),
            credits(50, ledger),
            Arc::new(contents),
            Arc::new(MockMenuRepository::new()),
        );
        let result = service
            .generate_description(&actor, &actor.org_id, description_input())
            .await
            .unwrap();
        assert_eq!(result.credits_used, 2);
        assert_eq!(result.remaining_credits, 48);
        assert_eq!(result.output["description"], "Crispy and fresh.");
    }

    #[tokio::test]
    async fn test_insufficient_credits_skips_provider() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let mut provider = MockAiProvider::new();
        provider.expect_complete().never();

        let service = AiService::new(
            Arc::new(provider),
            credits(0, MockCreditRepository::new()),
            Arc::new(MockAiContentRepository::new()),
            Arc::new(MockMenuRepository::new()),
        );
        let err = service
            .generate_description(&actor, &actor.org_id, description_input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientCredits { required: 1, available: 0 }));
    }

    #[tokio::test]
    async fn test_viewer_forbidden() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Viewer);
        let service = AiService::new(
            Arc::new(MockAiProvider::new()),
            credits(50, MockCreditRepository::new()),
            Arc::new(MockAiContentRepository::new()),
            Arc::new(MockMenuRepository::new()),
        );
        let err = service
            .generate_description(&actor, &actor.org_id, description_input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_generate_menu_invalid_json_not_charged() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let mut provider = MockAiProvider::new();
        provider.expect_complete()
            .withf(|req| req.json_response && req.tier == ModelTier::Advanced && req.max_tokens == 2000)
            .returning(|_| Ok(completion("not json", 900)));
        let mut ledger = MockCreditRepository::new();
        ledger.expect_deduct().never();

        let service = AiService::new(
            Arc::new(provider),
            credits(50, ledger),
            Arc::new(MockAiContentRepository::new()),
            Arc::new(MockMenuRepository::new()),
        );
        let err = service
            .generate_menu(
                &actor,
                &actor.org_id,
                GenerateMenu {
                    restaurant_name: "Cafe".into(),
                    cuisine_type: "Italian".into(),
                    categories: vec!["Pizza".into()],
                    items_per_category: 3,
                    language: "en".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AiProviderError(_)));
    }

    #[tokio::test]
    async fn test_generate_menu_rejects_empty_categories() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let service = AiService::new(
            Arc::new(MockAiProvider::new()),
            credits(50, MockCreditRepository::new()),
            Arc::new(MockAiContentRepository::new()),
            Arc::new(MockMenuRepository::new()),
        );
        let err = service
            .generate_menu(
                &actor,
                &actor.org_id,
                GenerateMenu {
                    restaurant_name: "Cafe".into(),
                    cuisine_type: "Italian".into(),
                    categories: vec![],
                    items_per_category: 5,
                    language: "en".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_provider_unavailable_propagates() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let mut provider = MockAiProvider::new();
        provider.expect_complete()
            .returning(|_| Err(DomainError::AiUnavailable("no api key".into())));

        let service = AiService::new(
            Arc::new(provider),
            credits(50, MockCreditRepository::new()),
            Arc::new(MockAiContentRepository::new()),
            Arc::new(MockMenuRepository::new()),
        );
        let err = service
            .generate_description(&actor, &actor.org_id, description_input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AiUnavailable(_)));
    }
}
