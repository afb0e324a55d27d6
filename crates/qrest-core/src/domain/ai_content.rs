//! Generated content history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Description,
    Translation,
    Menu,
    Prompt,
    Analysis,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Description => "DESCRIPTION",
            ContentType::Translation => "TRANSLATION",
            ContentType::Menu => "MENU",
            ContentType::Prompt => "PROMPT",
            ContentType::Analysis => "ANALYSIS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DESCRIPTION" => Some(ContentType::Description),
            "TRANSLATION" => Some(ContentType::Translation),
            "MENU" => Some(ContentType::Menu),
            "PROMPT" => Some(ContentType::Prompt),
            "ANALYSIS" => Some(ContentType::Analysis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGeneratedContent {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub prompt: String,
    pub response: String,
    pub tokens_used: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl AiGeneratedContent {
    pub fn new(
        org_id: Uuid,
        user_id: Uuid,
        content_type: ContentType,
        prompt: String,
        response: String,
        tokens_used: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id,
            user_id,
            content_type,
            prompt,
            response,
            tokens_used,
            approved: false,
            created_at: Utc::now(),
        }
    }
}
