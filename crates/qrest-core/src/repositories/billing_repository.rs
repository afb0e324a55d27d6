//! Plan, package, credit ledger and generated content repository traits (ports)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    AiGeneratedContent, ContentType, CreditPackage, CreditTransaction, SubscriptionPlan,
    TransactionType,
};
use crate::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanFilter {
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub tx_type: Option<TransactionType>,
    pub feature: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionPlanRepository: Send + Sync {
    /// Ordered by sort order, then price.
    async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<SubscriptionPlan>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<SubscriptionPlan>, DomainError>;
    async fn create(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan, DomainError>;
    async fn update(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditPackageRepository: Send + Sync {
    /// Ordered by sort order, then credits.
    async fn list(&self, active_only: bool) -> Result<Vec<CreditPackage>, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CreditPackage>, DomainError>;
    async fn create(&self, package: &CreditPackage) -> Result<CreditPackage, DomainError>;
    async fn update(&self, package: &CreditPackage) -> Result<CreditPackage, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// Guarded decrement plus USAGE ledger row in one transaction. Returns the
    /// new balance, or `None` when the balance was below `amount`.
    async fn deduct(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        feature: String,
        metadata: Option<Value>,
    ) -> Result<Option<i32>, DomainError>;
    /// Increment plus ledger row; returns the new balance.
    async fn add(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        tx_type: TransactionType,
        metadata: Option<Value>,
    ) -> Result<i32, DomainError>;
    /// Sets the balance to `allowance`, schedules the next reset and writes a
    /// MONTHLY_RESET row.
    async fn reset_monthly(
        &self,
        org_id: &Uuid,
        allowance: i32,
        next_reset: DateTime<Utc>,
        metadata: Option<Value>,
    ) -> Result<(), DomainError>;
    async fn list(
        &self,
        org_id: &Uuid,
        filter: TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CreditTransaction>, i64), DomainError>;
    /// USAGE rows since `since`, oldest first.
    async fn usage_since(
        &self,
        org_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CreditTransaction>, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiContentRepository: Send + Sync {
    async fn create(&self, content: &AiGeneratedContent) -> Result<AiGeneratedContent, DomainError>;
    async fn list(
        &self,
        org_id: &Uuid,
        content_type: Option<ContentType>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AiGeneratedContent>, i64), DomainError>;
}
