//! Subscription plan and credit package catalog, managed from the admin panel

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{CreditPackage, SubscriptionPlan};
use crate::error::DomainError;
use crate::repositories::{
    CreditPackageRepository, OrganizationRepository, PlanFilter, SubscriptionPlanRepository,
};

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlan {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub max_menus: i32,
    #[serde(default)]
    pub max_items: i32,
    #[serde(default)]
    pub max_team_members: i32,
    #[serde(default)]
    pub ai_credits_monthly: i32,
    #[serde(default)]
    pub has_custom_domain: bool,
    #[serde(default)]
    pub has_analytics: bool,
    #[serde(default)]
    pub has_api_access: bool,
    #[serde(default)]
    pub has_white_label: bool,
    #[serde(default)]
    pub has_priority_support: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub features: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub max_menus: Option<i32>,
    pub max_items: Option<i32>,
    pub max_team_members: Option<i32>,
    pub ai_credits_monthly: Option<i32>,
    pub has_custom_domain: Option<bool>,
    pub has_analytics: Option<bool>,
    pub has_api_access: Option<bool>,
    pub has_white_label: Option<bool>,
    pub has_priority_support: Option<bool>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub sort_order: Option<i32>,
    pub features: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackage {
    pub name: String,
    pub description: Option<String>,
    pub credits: i32,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub discount: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackage {
    pub name: Option<String>,
    pub description: Option<String>,
    pub credits: Option<i32>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub discount: Option<i32>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

pub struct CatalogService {
    plans: Arc<dyn SubscriptionPlanRepository>,
    packages: Arc<dyn CreditPackageRepository>,
    organizations: Arc<dyn OrganizationRepository>,
}

impl CatalogService {
    pub fn new(
        plans: Arc<dyn SubscriptionPlanRepository>,
        packages: Arc<dyn CreditPackageRepository>,
        organizations: Arc<dyn OrganizationRepository>,
    ) -> Self {
        Self {
            plans,
            packages,
            organizations,
        }
    }

    // Subscription plans

    pub async fn list_plans(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, DomainError> {
        self.plans.list(filter).await
    }

    pub async fn get_plan(&self, id: &Uuid) -> Result<SubscriptionPlan, DomainError> {
        self.plans
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Subscription plan"))
    }

    pub async fn create_plan(&self, input: CreatePlan) -> Result<SubscriptionPlan, DomainError> {
        let now = Utc::now();
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: input.name.trim().to_uppercase(),
            display_name: input.display_name.trim().to_string(),
            description: input.description,
            price: input.price,
            currency: input.currency.to_uppercase(),
            max_menus: input.max_menus,
            max_items: input.max_items,
            max_team_members: input.max_team_members,
            ai_credits_monthly: input.ai_credits_monthly,
            has_custom_domain: input.has_custom_domain,
            has_analytics: input.has_analytics,
            has_api_access: input.has_api_access,
            has_white_label: input.has_white_label,
            has_priority_support: input.has_priority_support,
            is_active: input.is_active,
            is_public: input.is_public,
            sort_order: input.sort_order,
            features: input.features,
            created_at: now,
            updated_at: now,
        };
        plan.validate()?;
        self.ensure_plan_name_free(&plan.name).await?;

        let plan = self.plans.create(&plan).await?;
        info!("Subscription plan created: {}", plan.name);
        Ok(plan)
    }

    pub async fn update_plan(&self, id: &Uuid, input: UpdatePlan) -> Result<SubscriptionPlan, DomainError> {
        let mut plan = self.get_plan(id).await?;

        if let Some(name) = input.name {
            let name = name.trim().to_uppercase();
            if name != plan.name {
                self.ensure_plan_name_free(&name).await?;
                plan.name = name;
            }
        }
        if let Some(v) = input.display_name {
            plan.display_name = v.trim().to_string();
        }
        if input.description.is_some() {
            plan.description = input.description;
        }
        if let Some(v) = input.price {
            plan.price = v;
        }
        if let Some(v) = input.currency {
            plan.currency = v.to_uppercase();
        }
        if let Some(v) = input.max_menus {
            plan.max_menus = v;
        }
        if let Some(v) = input.max_items {
            plan.max_items = v;
        }
        if let Some(v) = input.max_team_members {
            plan.max_team_members = v;
        }
        if let Some(v) = input.ai_credits_monthly {
            plan.ai_credits_monthly = v;
        }
        if let Some(v) = input.has_custom_domain {
            plan.has_custom_domain = v;
        }
        if let Some(v) = input.has_analytics {
            plan.has_analytics = v;
        }
        if let Some(v) = input.has_api_access {
            plan.has_api_access = v;
        }
        if let Some(v) = input.has_white_label {
            plan.has_white_label = v;
        }
        if let Some(v) = input.has_priority_support {
            plan.has_priority_support = v;
        }
        if let Some(v) = input.is_active {
            plan.is_active = v;
        }
        if let Some(v) = input.is_public {
            plan.is_public = v;
        }
        if let Some(v) = input.sort_order {
            plan.sort_order = v;
        }
        if input.features.is_some() {
            plan.features = input.features;
        }
        plan.validate()?;
        plan.updated_at = Utc::now();

        self.plans.update(&plan).await
    }

    /// Refused while any organization is still on the plan.
    pub async fn delete_plan(&self, id: &Uuid) -> Result<(), DomainError> {
        let plan = self.get_plan(id).await?;
        let in_use = self.organizations.count_on_plan(&plan.name).await?;
        if in_use > 0 {
            return Err(DomainError::ValidationError(format!(
                "Cannot delete plan: {} organization(s) are using it",
                in_use
            )));
        }

        self.plans.delete(id).await?;
        info!("Subscription plan deleted: {}", plan.name);
        Ok(())
    }

    pub async fn toggle_plan_active(&self, id: &Uuid) -> Result<SubscriptionPlan, DomainError> {
        let mut plan = self.get_plan(id).await?;
        plan.is_active = !plan.is_active;
        plan.updated_at = Utc::now();
        self.plans.update(&plan).await
    }

    pub async fn toggle_plan_public(&self, id: &Uuid) -> Result<SubscriptionPlan, DomainError> {
        let mut plan = self.get_plan(id).await?;
        plan.is_public = !plan.is_public;
        plan.updated_at = Utc::now();
        self.plans.update(&plan).await
    }

    async fn ensure_plan_name_free(&self, name: &str) -> Result<(), DomainError> {
        if self.plans.find_by_name(name).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Subscription plan with name {} already exists",
                name
            )));
        }
        Ok(())
    }

    // Credit packages

    pub async fn list_packages(&self) -> Result<Vec<CreditPackage>, DomainError> {
        self.packages.list(false).await
    }

    pub async fn get_package(&self, id: &Uuid) -> Result<CreditPackage, DomainError> {
        self.packages
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Credit package"))
    }

    pub async fn create_package(&self, input: CreatePackage) -> Result<CreditPackage, DomainError> {
        let now = Utc::now();
        let package = CreditPackage {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            credits: input.credits,
            price: input.price,
            currency: input.currency.to_uppercase(),
            discount: input.discount,
            is_active: input.is_active,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };
        package.validate()?;

        let package = self.packages.create(&package).await?;
        info!("Credit package created: {}", package.name);
        Ok(package)
    }

    pub async fn update_package(&self, id: &Uuid, input: UpdatePackage) -> Result<CreditPackage, DomainError> {
        let mut package = self.get_package(id).await?;
        if let Some(v) = input.name {
            package.name = v.trim().to_string();
        }
        if input.description.is_some() {
            package.description = input.description;
        }
        if let Some(v) = input.credits {
            package.credits = v;
        }
        if let Some(v) = input.price {
            package.price = v;
        }
        if let Some(v) = input.currency {
            package.currency = v.to_uppercase();
        }
        if let Some(v) = input.discount {
            package.discount = v;
        }
        if let Some(v) = input.is_active {
            package.is_active = v;
        }
        if let Some(v) = input.sort_order {
            package.sort_order = v;
        }
        package.validate()?;
        package.updated_at = Utc::now();

        self.packages.update(&package).await
    }

    pub async fn delete_package(&self, id: &Uuid) -> Result<(), DomainError> {
        if !self.packages.delete(id).await? {
            return Err(DomainError::NotFound("Credit package"));
        }
        info!("Credit package deleted: {}", id);
        Ok(())
    }

    pub async fn toggle_package_active(&self, id: &Uuid) -> Result<CreditPackage, DomainError> {
        let mut package = self.get_package(id).await?;
        package.is_active = !package.is_active;
        package.updated_at = Utc::now();
        self.packages.update(&package).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockCreditPackageRepository, MockOrganizationRepository, MockSubscriptionPlanRepository,
    };

    fn create_input(name: &str) -> CreatePlan {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "displayName": "Pro",
            "price": 19.0,
            "aiCreditsMonthly": 500
        }))
        .unwrap()
    }

    fn service(
        plans: MockSubscriptionPlanRepository,
        packages: MockCreditPackageRepository,
        organizations: MockOrganizationRepository,
    ) -> CatalogService {
        CatalogService::new(Arc::new(plans), Arc::new(packages), Arc::new(organizations))
    }

    fn existing_plan() -> SubscriptionPlan {
        let now = Utc::now();
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "PRO".into(),
            display_name: "Pro".into(),
            description: None,
            price: 19.0,
            currency: "USD".into(),
            max_menus: 10,
            max_items: -1,
            max_team_members: 5,
            ai_credits_monthly: 500,
            has_custom_domain: false,
            has_analytics: true,
            has_api_access: false,
            has_white_label: false,
            has_priority_support: false,
            is_active: true,
            is_public: true,
            sort_order: 2,
            features: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_plan_defaults() {
        let mut plans = MockSubscriptionPlanRepository::new();
        plans.expect_find_by_name()
            .withf(|name| name == "PRO")
            .returning(|_| Ok(None));
        plans.expect_create().returning(|p| Ok(p.clone()));

        let plan = service(plans, MockCreditPackageRepository::new(), MockOrganizationRepository::new())
            .create_plan(create_input("pro"))
            .await
            .unwrap();
        assert_eq!(plan.name, "PRO");
        assert_eq!(plan.currency, "USD");
        assert!(plan.is_active);
        assert!(plan.is_public);
    }

    #[tokio::test]
    async fn test_create_plan_duplicate_name_conflict() {
        let mut plans = MockSubscriptionPlanRepository::new();
        plans.expect_find_by_name().returning(|_| Ok(Some(existing_plan())));

        let err = service(plans, MockCreditPackageRepository::new(), MockOrganizationRepository::new())
            .create_plan(create_input("pro"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_plan_in_use_refused() {
        let plan = existing_plan();
        let mut plans = MockSubscriptionPlanRepository::new();
        plans.expect_find_by_id().returning(move |_| Ok(Some(plan.clone())));
        plans.expect_delete().never();
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_count_on_plan()
            .withf(|name| name == "PRO")
            .returning(|_| Ok(3));

        let err = service(plans, MockCreditPackageRepository::new(), organizations)
            .delete_plan(&Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot delete plan: 3 organization(s) are using it"
        );
    }

    #[tokio::test]
    async fn test_toggle_public() {
        let plan = existing_plan();
        let mut plans = MockSubscriptionPlanRepository::new();
        plans.expect_find_by_id().returning(move |_| Ok(Some(plan.clone())));
        plans.expect_update().returning(|p| Ok(p.clone()));

        let plan = service(plans, MockCreditPackageRepository::new(), MockOrganizationRepository::new())
            .toggle_plan_public(&Uuid::new_v4())
            .await
            .unwrap();
        assert!(!plan.is_public);
    }

    #[tokio::test]
    async fn test_create_package_validates_discount() {
        let input: CreatePackage = serde_json::from_value(serde_json::json!({
            "name": "Boost",
            "credits": 100,
            "price": 5.0,
            "discount": 150
        }))
        .unwrap();
        let err = service(
            MockSubscriptionPlanRepository::new(),
            MockCreditPackageRepository::new(),
            MockOrganizationRepository::new(),
        )
        .create_package(input)
        .await
        .unwrap_err();
        assert!(err.to_string().contains("discount"));
    }
}
