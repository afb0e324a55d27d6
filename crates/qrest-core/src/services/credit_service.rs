// ============================================================================
// QRest Core - Credit Service
// File: crates/qrest-core/src/services/credit_service.rs
// Description: AI credit balance, ledger, packages and the monthly reset
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use qrest_shared::constants::{CREDIT_RESET_INTERVAL_DAYS, UNLIMITED};

use crate::domain::{
    AiGeneratedContent, ContentType, CreditFeature, CreditPackage, CreditTransaction, Organization,
    Role, TransactionType,
};
use crate::error::DomainError;
use crate::repositories::{
    AiContentRepository, CreditPackageRepository, CreditRepository, OrganizationRepository,
    SubscriptionPlanRepository, TransactionFilter,
};
use crate::services::context::Actor;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub current_balance: i32,
    pub total_used: i32,
    pub monthly_allowance: i32,
    pub next_reset_date: Option<DateTime<Utc>>,
    pub plan_name: String,
}

/// Limit/offset window used by the ledger and history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl OffsetPagination {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<CreditTransaction>,
    pub pagination: OffsetPagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentPage {
    pub content: Vec<AiGeneratedContent>,
    pub pagination: OffsetPagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBucket {
    pub count: i64,
    pub total_credits: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_credits_used: i64,
    pub total_transactions: i64,
    pub by_feature: BTreeMap<String, UsageBucket>,
    pub by_day: BTreeMap<String, UsageBucket>,
    pub period: UsagePeriod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub package: CreditPackage,
    pub credits_added: i32,
    pub new_balance: i32,
}

pub struct CreditService {
    organizations: Arc<dyn OrganizationRepository>,
    credits: Arc<dyn CreditRepository>,
    plans: Arc<dyn SubscriptionPlanRepository>,
    packages: Arc<dyn CreditPackageRepository>,
    contents: Arc<dyn AiContentRepository>,
}

impl CreditService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        credits: Arc<dyn CreditRepository>,
        plans: Arc<dyn SubscriptionPlanRepository>,
        packages: Arc<dyn CreditPackageRepository>,
        contents: Arc<dyn AiContentRepository>,
    ) -> Self {
        Self {
            organizations,
            credits,
            plans,
            packages,
            contents,
        }
    }

    /// Current balance, failing with `InsufficientCredits` when below `required`.
    pub async fn ensure_available(&self, org_id: &Uuid, required: i32) -> Result<i32, DomainError> {
        let org = self.organization(org_id).await?;
        if org.ai_credits < required {
            return Err(DomainError::InsufficientCredits {
                required,
                available: org.ai_credits,
            });
        }
        Ok(org.ai_credits)
    }

    /// Spends credits for a feature and returns the remaining balance.
    pub async fn deduct(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        feature: CreditFeature,
        metadata: Option<Value>,
    ) -> Result<i32, DomainError> {
        match self
            .credits
            .deduct(org_id, user_id, amount, feature.as_str().to_string(), metadata)
            .await?
        {
            Some(balance) => {
                info!(
                    "Deducted {} credits from org {} for {} (balance {})",
                    amount,
                    org_id,
                    feature.as_str(),
                    balance
                );
                Ok(balance)
            }
            None => {
                let available = self.organization(org_id).await?.ai_credits;
                Err(DomainError::InsufficientCredits {
                    required: amount,
                    available,
                })
            }
        }
    }

    pub async fn add(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        tx_type: TransactionType,
        metadata: Option<Value>,
    ) -> Result<i32, DomainError> {
        if amount <= 0 {
            return Err(DomainError::ValidationError("Amount must be positive".into()));
        }
        self.credits.add(org_id, user_id, amount, tx_type, metadata).await
    }

    pub async fn balance(&self, actor: &Actor, org_id: &Uuid) -> Result<CreditBalance, DomainError> {
        actor.require_org(org_id)?;
        let org = self.organization(org_id).await?;
        let plan = self.plans.find_by_name(org.plan.as_str()).await?;

        Ok(CreditBalance {
            current_balance: org.ai_credits,
            total_used: org.ai_credits_used,
            monthly_allowance: plan.as_ref().map_or(0, |p| p.ai_credits_monthly),
            next_reset_date: org.credit_reset_date,
            plan_name: plan
                .map(|p| p.display_name)
                .unwrap_or_else(|| org.plan.as_str().to_string()),
        })
    }

    pub async fn transactions(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        filter: TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionPage, DomainError> {
        actor.require_org(org_id)?;
        let (limit, offset) = (limit.clamp(1, 100), offset.max(0));
        let (transactions, total) = self.credits.list(org_id, filter, limit, offset).await?;
        Ok(TransactionPage {
            transactions,
            pagination: OffsetPagination::new(total, limit, offset),
        })
    }

    pub async fn usage_stats(&self, actor: &Actor, org_id: &Uuid, days: i64) -> Result<UsageStats, DomainError> {
        actor.require_org(org_id)?;
        let days = days.clamp(1, 365);
        let end = Utc::now();
        let start = end - Duration::days(days);
        let rows = self.credits.usage_since(org_id, start).await?;
        Ok(summarize_usage(&rows, start, end, days))
    }

    pub async fn packages(&self) -> Result<Vec<CreditPackage>, DomainError> {
        self.packages.list(true).await
    }

    /// Payment is not collected; credits are granted as a PURCHASE.
    pub async fn purchase_package(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        package_id: &Uuid,
    ) -> Result<PurchaseResult, DomainError> {
        actor.require_org(org_id)?;
        actor.require_role(Role::Admin)?;

        let package = self
            .packages
            .find_by_id(package_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(DomainError::NotFound("Credit package"))?;

        let new_balance = self
            .credits
            .add(
                org_id,
                Some(actor.user_id),
                package.credits,
                TransactionType::Purchase,
                Some(json!({
                    "packageId": package.id,
                    "packageName": package.name,
                    "price": package.price,
                    "currency": package.currency,
                })),
            )
            .await?;

        info!("Org {} purchased package {}", org_id, package.name);
        Ok(PurchaseResult {
            credits_added: package.credits,
            new_balance,
            package,
        })
    }

    pub async fn history(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        content_type: Option<ContentType>,
        limit: i64,
        offset: i64,
    ) -> Result<ContentPage, DomainError> {
        actor.require_org(org_id)?;
        let (limit, offset) = (limit.clamp(1, 100), offset.max(0));
        let (content, total) = self.contents.list(org_id, content_type, limit, offset).await?;
        Ok(ContentPage {
            content,
            pagination: OffsetPagination::new(total, limit, offset),
        })
    }

    /// Resets every organization whose reset date has passed. Returns how
    /// many were reset.
    pub async fn reset_monthly_credits(&self) -> Result<usize, DomainError> {
        let now = Utc::now();
        let due = self.organizations.find_due_for_credit_reset(now).await?;
        let mut reset = 0;

        for org in due {
            let Some(plan) = self.plans.find_by_name(org.plan.as_str()).await? else {
                warn!("No subscription plan {} for org {}", org.plan.as_str(), org.id);
                continue;
            };
            if plan.ai_credits_monthly == UNLIMITED {
                continue;
            }

            let next_reset = now + Duration::days(CREDIT_RESET_INTERVAL_DAYS);
            self.credits
                .reset_monthly(
                    &org.id,
                    plan.ai_credits_monthly,
                    next_reset,
                    Some(json!({
                        "plan": plan.name,
                        "previousBalance": org.ai_credits,
                    })),
                )
                .await?;
            reset += 1;
        }

        if reset > 0 {
            info!("Monthly credits reset for {} organizations", reset);
        }
        Ok(reset)
    }

    async fn organization(&self, org_id: &Uuid) -> Result<Organization, DomainError> {
        self.organizations
            .find_by_id(org_id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))
    }
}

fn summarize_usage(
    rows: &[CreditTransaction],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    days: i64,
) -> UsageStats {
    let mut by_feature: BTreeMap<String, UsageBucket> = BTreeMap::new();
    let mut by_day: BTreeMap<String, UsageBucket> = BTreeMap::new();
    let mut total = 0;

    for row in rows {
        let spent = i64::from(row.amount.unsigned_abs());
        total += spent;

        let feature = row.feature.clone().unwrap_or_else(|| "UNKNOWN".to_string());
        let bucket = by_feature.entry(feature).or_default();
        bucket.count += 1;
        bucket.total_credits += spent;

        let day = row.created_at.date_naive().to_string();
        let bucket = by_day.entry(day).or_default();
        bucket.count += 1;
        bucket.total_credits += spent;
    }

    UsageStats {
        total_credits_used: total,
        total_transactions: rows.len() as i64,
        by_feature,
        by_day,
        period: UsagePeriod { start, end, days },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionPlan;
    use crate::repositories::{
        MockAiContentRepository, MockCreditPackageRepository, MockCreditRepository,
        MockOrganizationRepository, MockSubscriptionPlanRepository,
    };

    struct Mocks {
        organizations: MockOrganizationRepository,
        credits: MockCreditRepository,
        plans: MockSubscriptionPlanRepository,
        packages: MockCreditPackageRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                organizations: MockOrganizationRepository::new(),
                credits: MockCreditRepository::new(),
                plans: MockSubscriptionPlanRepository::new(),
                packages: MockCreditPackageRepository::new(),
            }
        }

        fn build(self) -> CreditService {
            CreditService::new(
                Arc::new(self.organizations),
                Arc::new(self.credits),
                Arc::new(self.plans),
                Arc::new(self.packages),
                Arc::new(MockAiContentRepository::new()),
            )
        }
    }

    fn plan(name: &str, monthly: i32) -> SubscriptionPlan {
        let now = Utc::now();
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: name.into(),
            display_name: format!("{} plan", name),
            description: None,
            price: 0.0,
            currency: "USD".into(),
            max_menus: 1,
            max_items: 50,
            max_team_members: 1,
            ai_credits_monthly: monthly,
            has_custom_domain: false,
            has_analytics: false,
            has_api_access: false,
            has_white_label: false,
            has_priority_support: false,
            is_active: true,
            is_public: true,
            sort_order: 0,
            features: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usage(amount: i32, feature: &str) -> CreditTransaction {
        CreditTransaction {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            user_id: None,
            amount,
            balance: 0,
            tx_type: TransactionType::Usage,
            feature: Some(feature.into()),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ensure_available_insufficient() {
        let mut org = Organization::new("Cafe", "cafe").unwrap();
        org.ai_credits = 1;
        let mut mocks = Mocks::new();
        mocks.organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));

        let err = mocks.build().ensure_available(&Uuid::new_v4(), 2).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientCredits { required: 2, available: 1 }
        ));
    }

    #[tokio::test]
    async fn test_deduct_guard_failure_reports_balance() {
        let mut org = Organization::new("Cafe", "cafe").unwrap();
        org.ai_credits = 0;
        let mut mocks = Mocks::new();
        mocks.credits.expect_deduct().returning(|_, _, _, _, _| Ok(None));
        mocks.organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));

        let err = mocks
            .build()
            .deduct(&Uuid::new_v4(), None, 1, CreditFeature::Description, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientCredits { available: 0, .. }));
    }

    #[tokio::test]
    async fn test_deduct_passes_feature_name() {
        let mut mocks = Mocks::new();
        mocks.credits.expect_deduct()
            .withf(|_, _, amount, feature, _| *amount == 2 && feature == "MENU_GEN")
            .returning(|_, _, _, _, _| Ok(Some(48)));

        let balance = mocks
            .build()
            .deduct(&Uuid::new_v4(), None, 2, CreditFeature::MenuGen, None)
            .await
            .unwrap();
        assert_eq!(balance, 48);
    }

    #[tokio::test]
    async fn test_balance_uses_plan_display_name() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let actor = Actor::new(Uuid::new_v4(), org.id, Role::Viewer);
        let mut mocks = Mocks::new();
        mocks.organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        mocks.plans.expect_find_by_name()
            .withf(|name| name == "FREE")
            .returning(|_| Ok(Some(plan("FREE", 50))));

        let balance = mocks.build().balance(&actor, &actor.org_id).await.unwrap();
        assert_eq!(balance.current_balance, 50);
        assert_eq!(balance.monthly_allowance, 50);
        assert_eq!(balance.plan_name, "FREE plan");
    }

    #[tokio::test]
    async fn test_balance_other_org_forbidden() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let err = Mocks::new().build().balance(&actor, &Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_purchase_inactive_package_not_found() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Admin);
        let mut mocks = Mocks::new();
        mocks.packages.expect_find_by_id().returning(|id| {
            let now = Utc::now();
            Ok(Some(CreditPackage {
                id: *id,
                name: "Small".into(),
                description: None,
                credits: 100,
                price: 9.99,
                currency: "USD".into(),
                discount: 0,
                is_active: false,
                sort_order: 0,
                created_at: now,
                updated_at: now,
            }))
        });

        let err = mocks
            .build()
            .purchase_package(&actor, &actor.org_id, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Credit package not found");
    }

    #[tokio::test]
    async fn test_monthly_reset_skips_unlimited_and_missing_plans() {
        let mut free = Organization::new("Free", "free-org").unwrap();
        free.ai_credits = 3;
        let mut pro = Organization::new("Pro", "pro-org").unwrap();
        pro.plan = crate::domain::Plan::Pro;
        let mut enterprise = Organization::new("Ent", "ent-org").unwrap();
        enterprise.plan = crate::domain::Plan::Enterprise;
        let free_id = free.id;

        let mut mocks = Mocks::new();
        mocks.organizations.expect_find_due_for_credit_reset()
            .returning(move |_| Ok(vec![free.clone(), pro.clone(), enterprise.clone()]));
        mocks.plans.expect_find_by_name().returning(|name| match name {
            "FREE" => Ok(Some(plan("FREE", 50))),
            "ENTERPRISE" => Ok(Some(plan("ENTERPRISE", -1))),
            _ => Ok(None),
        });
        mocks.credits.expect_reset_monthly()
            .withf(move |org_id, allowance, next, _| {
                *org_id == free_id && *allowance == 50 && *next > Utc::now() + Duration::days(29)
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        assert_eq!(mocks.build().reset_monthly_credits().await.unwrap(), 1);
    }

    #[test]
    fn test_summarize_usage_groups() {
        let rows = vec![
            usage(-1, "DESCRIPTION"),
            usage(-2, "MENU_GEN"),
            usage(-1, "DESCRIPTION"),
        ];
        let now = Utc::now();
        let stats = summarize_usage(&rows, now - Duration::days(30), now, 30);
        assert_eq!(stats.total_credits_used, 4);
        assert_eq!(stats.total_transactions, 3);
        assert_eq!(
            stats.by_feature["DESCRIPTION"],
            UsageBucket { count: 2, total_credits: 2 }
        );
        assert_eq!(stats.by_day.len(), 1);
    }

    #[test]
    fn test_offset_pagination_has_more() {
        assert!(OffsetPagination::new(120, 50, 50).has_more);
        assert!(!OffsetPagination::new(100, 50, 50).has_more);
    }
}
