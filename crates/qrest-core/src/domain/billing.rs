// ============================================================================
// QRest Core - Billing Entities
// File: crates/qrest-core/src/domain/billing.rs
// Description: Subscription plans, credit packages and the credit ledger
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use qrest_shared::constants::{TOKENS_PER_CREDIT, UNLIMITED};

/// Credits charged for a generation that consumed `tokens` tokens.
pub fn credit_cost(tokens: i64) -> i32 {
    let tokens = tokens.max(0);
    ((tokens + TOKENS_PER_CREDIT - 1) / TOKENS_PER_CREDIT) as i32
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Plan name must be 1-50 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,

    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,

    #[validate(range(min = -1, message = "Use -1 for unlimited"))]
    pub max_menus: i32,
    #[validate(range(min = -1, message = "Use -1 for unlimited"))]
    pub max_items: i32,
    #[validate(range(min = -1, message = "Use -1 for unlimited"))]
    pub max_team_members: i32,
    #[validate(range(min = -1, message = "Use -1 for unlimited"))]
    pub ai_credits_monthly: i32,

    pub has_custom_domain: bool,
    pub has_analytics: bool,
    pub has_api_access: bool,
    pub has_white_label: bool,
    pub has_priority_support: bool,
    pub is_active: bool,
    pub is_public: bool,
    pub sort_order: i32,
    pub features: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn has_unlimited_credits(&self) -> bool {
        self.ai_credits_monthly == UNLIMITED
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditPackage {
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Package name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Credits must be at least 1"))]
    pub credits: i32,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    pub currency: String,

    #[validate(range(min = 0, max = 100, message = "Discount must be between 0 and 100"))]
    pub discount: i32,

    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Usage,
    Purchase,
    Bonus,
    Refund,
    MonthlyReset,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Usage => "USAGE",
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Bonus => "BONUS",
            TransactionType::Refund => "REFUND",
            TransactionType::MonthlyReset => "MONTHLY_RESET",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USAGE" => Some(TransactionType::Usage),
            "PURCHASE" => Some(TransactionType::Purchase),
            "BONUS" => Some(TransactionType::Bonus),
            "REFUND" => Some(TransactionType::Refund),
            "MONTHLY_RESET" => Some(TransactionType::MonthlyReset),
            _ => None,
        }
    }
}

/// Ledger row. `amount` is negative for usage, `balance` is the balance
/// after the row was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: Option<Uuid>,
    pub amount: i32,
    pub balance: i32,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub feature: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Features that spend credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditFeature {
    Description,
    Translation,
    MenuGen,
    ImagePrompt,
    Optimization,
    MenuAnalysis,
}

impl CreditFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditFeature::Description => "DESCRIPTION",
            CreditFeature::Translation => "TRANSLATION",
            CreditFeature::MenuGen => "MENU_GEN",
            CreditFeature::ImagePrompt => "IMAGE_PROMPT",
            CreditFeature::Optimization => "OPTIMIZATION",
            CreditFeature::MenuAnalysis => "MENU_ANALYSIS",
        }
    }
}
