// ============================================================================
// QRest Infrastructure - PostgreSQL Billing Repositories
// File: crates/qrest-infrastructure/src/database/postgres/billing_repo_impl.rs
// Description: Plans, credit packages, the credit ledger and generated content
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use qrest_core::domain::{
    AiGeneratedContent, ContentType, CreditPackage, CreditTransaction, SubscriptionPlan,
    TransactionType,
};
use qrest_core::error::DomainError;
use qrest_core::repositories::{
    AiContentRepository, CreditPackageRepository, CreditRepository, PlanFilter,
    SubscriptionPlanRepository, TransactionFilter,
};

use crate::database::error::map_db_error;

// ----------------------------------------------------------------------------
// Subscription plans
// ----------------------------------------------------------------------------

const PLAN_COLUMNS: &str = "id, name, display_name, description, price, currency, max_menus, \
    max_items, max_team_members, ai_credits_monthly, has_custom_domain, has_analytics, \
    has_api_access, has_white_label, has_priority_support, is_active, is_public, sort_order, \
    features, created_at, updated_at";

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    display_name: String,
    description: Option<String>,
    price: f64,
    currency: String,
    max_menus: i32,
    max_items: i32,
    max_team_members: i32,
    ai_credits_monthly: i32,
    has_custom_domain: bool,
    has_analytics: bool,
    has_api_access: bool,
    has_white_label: bool,
    has_priority_support: bool,
    is_active: bool,
    is_public: bool,
    sort_order: i32,
    features: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        SubscriptionPlan {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            price: row.price,
            currency: row.currency,
            max_menus: row.max_menus,
            max_items: row.max_items,
            max_team_members: row.max_team_members,
            ai_credits_monthly: row.ai_credits_monthly,
            has_custom_domain: row.has_custom_domain,
            has_analytics: row.has_analytics,
            has_api_access: row.has_api_access,
            has_white_label: row.has_white_label,
            has_priority_support: row.has_priority_support,
            is_active: row.is_active,
            is_public: row.is_public,
            sort_order: row.sort_order,
            features: row.features,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgSubscriptionPlanRepository {
    pool: PgPool,
}

impl PgSubscriptionPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionPlanRepository for PgSubscriptionPlanRepository {
    async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM subscription_plans
            WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
              AND ($2::BOOLEAN IS NULL OR is_public = $2)
            ORDER BY sort_order, price
            "#,
            PLAN_COLUMNS
        ))
        .bind(filter.is_active)
        .bind(filter.is_public)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing subscription plans", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<SubscriptionPlan>, DomainError> {
        let row: Option<PlanRow> =
            sqlx::query_as(&format!("SELECT {} FROM subscription_plans WHERE id = $1", PLAN_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding subscription plan", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<SubscriptionPlan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscription_plans WHERE name = $1",
            PLAN_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding subscription plan by name", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan, DomainError> {
        let row: PlanRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscription_plans ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21)
            RETURNING {cols}
            "#,
            cols = PLAN_COLUMNS
        ))
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.display_name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(&plan.currency)
        .bind(plan.max_menus)
        .bind(plan.max_items)
        .bind(plan.max_team_members)
        .bind(plan.ai_credits_monthly)
        .bind(plan.has_custom_domain)
        .bind(plan.has_analytics)
        .bind(plan.has_api_access)
        .bind(plan.has_white_label)
        .bind(plan.has_priority_support)
        .bind(plan.is_active)
        .bind(plan.is_public)
        .bind(plan.sort_order)
        .bind(&plan.features)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating subscription plan", e))?;

        Ok(row.into())
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            r#"
            UPDATE subscription_plans
            SET name = $2, display_name = $3, description = $4, price = $5, currency = $6,
                max_menus = $7, max_items = $8, max_team_members = $9, ai_credits_monthly = $10,
                has_custom_domain = $11, has_analytics = $12, has_api_access = $13,
                has_white_label = $14, has_priority_support = $15, is_active = $16,
                is_public = $17, sort_order = $18, features = $19, updated_at = $20
            WHERE id = $1
            RETURNING {}
            "#,
            PLAN_COLUMNS
        ))
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.display_name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(&plan.currency)
        .bind(plan.max_menus)
        .bind(plan.max_items)
        .bind(plan.max_team_members)
        .bind(plan.ai_credits_monthly)
        .bind(plan.has_custom_domain)
        .bind(plan.has_analytics)
        .bind(plan.has_api_access)
        .bind(plan.has_white_label)
        .bind(plan.has_priority_support)
        .bind(plan.is_active)
        .bind(plan.is_public)
        .bind(plan.sort_order)
        .bind(&plan.features)
        .bind(plan.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating subscription plan", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Subscription plan"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM subscription_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting subscription plan", e))?;

        Ok(result.rows_affected() > 0)
    }
}

// ----------------------------------------------------------------------------
// Credit packages
// ----------------------------------------------------------------------------

const PACKAGE_COLUMNS: &str = "id, name, description, credits, price, currency, discount, \
                               is_active, sort_order, created_at, updated_at";

#[derive(Debug, FromRow)]
struct PackageRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    credits: i32,
    price: f64,
    currency: String,
    discount: i32,
    is_active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PackageRow> for CreditPackage {
    fn from(row: PackageRow) -> Self {
        CreditPackage {
            id: row.id,
            name: row.name,
            description: row.description,
            credits: row.credits,
            price: row.price,
            currency: row.currency,
            discount: row.discount,
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgCreditPackageRepository {
    pool: PgPool,
}

impl PgCreditPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditPackageRepository for PgCreditPackageRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<CreditPackage>, DomainError> {
        let rows: Vec<PackageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM credit_packages WHERE (NOT $1 OR is_active) ORDER BY sort_order, credits",
            PACKAGE_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing credit packages", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CreditPackage>, DomainError> {
        let row: Option<PackageRow> =
            sqlx::query_as(&format!("SELECT {} FROM credit_packages WHERE id = $1", PACKAGE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding credit package", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, package: &CreditPackage) -> Result<CreditPackage, DomainError> {
        let row: PackageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO credit_packages ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {cols}
            "#,
            cols = PACKAGE_COLUMNS
        ))
        .bind(package.id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.credits)
        .bind(package.price)
        .bind(&package.currency)
        .bind(package.discount)
        .bind(package.is_active)
        .bind(package.sort_order)
        .bind(package.created_at)
        .bind(package.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating credit package", e))?;

        Ok(row.into())
    }

    async fn update(&self, package: &CreditPackage) -> Result<CreditPackage, DomainError> {
        let row: Option<PackageRow> = sqlx::query_as(&format!(
            r#"
            UPDATE credit_packages
            SET name = $2, description = $3, credits = $4, price = $5, currency = $6,
                discount = $7, is_active = $8, sort_order = $9, updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            PACKAGE_COLUMNS
        ))
        .bind(package.id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.credits)
        .bind(package.price)
        .bind(&package.currency)
        .bind(package.discount)
        .bind(package.is_active)
        .bind(package.sort_order)
        .bind(package.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating credit package", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Credit package"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM credit_packages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting credit package", e))?;

        Ok(result.rows_affected() > 0)
    }
}

// ----------------------------------------------------------------------------
// Credit ledger
// ----------------------------------------------------------------------------

/// Refills the balance and moves the reset date. Lifetime usage is kept.
const MONTHLY_RESET_SQL: &str = "UPDATE organizations \
    SET ai_credits = $2, credit_reset_date = $3, updated_at = NOW() \
    WHERE id = $1";

const TX_COLUMNS: &str = "id, org_id, user_id, amount, balance, type, feature, metadata, created_at";

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    org_id: Uuid,
    user_id: Option<Uuid>,
    amount: i32,
    balance: i32,
    #[sqlx(rename = "type")]
    tx_type: String,
    feature: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for CreditTransaction {
    fn from(row: TransactionRow) -> Self {
        CreditTransaction {
            id: row.id,
            org_id: row.org_id,
            user_id: row.user_id,
            amount: row.amount,
            balance: row.balance,
            tx_type: TransactionType::from_str(&row.tx_type).unwrap_or(TransactionType::Usage),
            feature: row.feature,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

struct LedgerEntry<'a> {
    org_id: &'a Uuid,
    user_id: Option<Uuid>,
    amount: i32,
    balance: i32,
    tx_type: TransactionType,
    feature: Option<String>,
    metadata: Option<Value>,
}

async fn insert_ledger_row(
    transaction: &mut Transaction<'_, Postgres>,
    entry: LedgerEntry<'_>,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO ai_credit_transactions (id, org_id, user_id, amount, balance, type, feature, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.org_id)
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.balance)
    .bind(entry.tx_type.as_str())
    .bind(entry.feature)
    .bind(entry.metadata)
    .execute(&mut **transaction)
    .await
    .map_err(|e| map_db_error("writing credit ledger row", e))?;
    Ok(())
}

pub struct PgCreditRepository {
    pool: PgPool,
}

impl PgCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditRepository for PgCreditRepository {
    async fn deduct(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        feature: String,
        metadata: Option<Value>,
    ) -> Result<Option<i32>, DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting credit deduction", e))?;

        let balance: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE organizations
            SET ai_credits = ai_credits - $2, ai_credits_used = ai_credits_used + $2, updated_at = NOW()
            WHERE id = $1 AND ai_credits >= $2
            RETURNING ai_credits
            "#,
        )
        .bind(org_id)
        .bind(amount)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|e| map_db_error("deducting credits", e))?;

        let Some(balance) = balance else {
            return Ok(None);
        };

        insert_ledger_row(
            &mut transaction,
            LedgerEntry {
                org_id,
                user_id,
                amount: -amount,
                balance,
                tx_type: TransactionType::Usage,
                feature: Some(feature),
                metadata,
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing credit deduction", e))?;

        debug!("Deducted {} credits from org {}, balance {}", amount, org_id, balance);
        Ok(Some(balance))
    }

    async fn add(
        &self,
        org_id: &Uuid,
        user_id: Option<Uuid>,
        amount: i32,
        tx_type: TransactionType,
        metadata: Option<Value>,
    ) -> Result<i32, DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting credit grant", e))?;

        let balance: Option<i32> = sqlx::query_scalar(
            "UPDATE organizations SET ai_credits = ai_credits + $2, updated_at = NOW() WHERE id = $1 RETURNING ai_credits",
        )
        .bind(org_id)
        .bind(amount)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|e| map_db_error("adding credits", e))?;
        let balance = balance.ok_or(DomainError::NotFound("Organization"))?;

        insert_ledger_row(
            &mut transaction,
            LedgerEntry {
                org_id,
                user_id,
                amount,
                balance,
                tx_type,
                feature: None,
                metadata,
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing credit grant", e))?;

        info!("Added {} credits to org {} ({})", amount, org_id, tx_type.as_str());
        Ok(balance)
    }

    async fn reset_monthly(
        &self,
        org_id: &Uuid,
        allowance: i32,
        next_reset: DateTime<Utc>,
        metadata: Option<Value>,
    ) -> Result<(), DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting monthly reset", e))?;

        sqlx::query(MONTHLY_RESET_SQL)
        .bind(org_id)
        .bind(allowance)
        .bind(next_reset)
        .execute(&mut *transaction)
        .await
        .map_err(|e| map_db_error("resetting monthly credits", e))?;

        insert_ledger_row(
            &mut transaction,
            LedgerEntry {
                org_id,
                user_id: None,
                amount: allowance,
                balance: allowance,
                tx_type: TransactionType::MonthlyReset,
                feature: None,
                metadata,
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing monthly reset", e))
    }

    async fn list(
        &self,
        org_id: &Uuid,
        filter: TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CreditTransaction>, i64), DomainError> {
        let tx_type = filter.tx_type.map(|t| t.as_str());
        let condition = "org_id = $1 AND ($2::TEXT IS NULL OR type = $2) AND ($3::TEXT IS NULL OR feature = $3)";

        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ai_credit_transactions WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            TX_COLUMNS, condition
        ))
        .bind(org_id)
        .bind(tx_type)
        .bind(&filter.feature)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing credit transactions", e))?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM ai_credit_transactions WHERE {}",
            condition
        ))
        .bind(org_id)
        .bind(tx_type)
        .bind(&filter.feature)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting credit transactions", e))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn usage_since(
        &self,
        org_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CreditTransaction>, DomainError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM ai_credit_transactions
            WHERE org_id = $1 AND type = 'USAGE' AND created_at >= $2
            ORDER BY created_at ASC
            "#,
            TX_COLUMNS
        ))
        .bind(org_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("reading credit usage", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ----------------------------------------------------------------------------
// Generated content
// ----------------------------------------------------------------------------

const CONTENT_COLUMNS: &str =
    "id, org_id, user_id, type, prompt, response, tokens_used, approved, created_at";

#[derive(Debug, FromRow)]
struct ContentRow {
    id: Uuid,
    org_id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    content_type: String,
    prompt: String,
    response: String,
    tokens_used: i32,
    approved: bool,
    created_at: DateTime<Utc>,
}

impl From<ContentRow> for AiGeneratedContent {
    fn from(row: ContentRow) -> Self {
        AiGeneratedContent {
            id: row.id,
            org_id: row.org_id,
            user_id: row.user_id,
            content_type: ContentType::from_str(&row.content_type).unwrap_or(ContentType::Description),
            prompt: row.prompt,
            response: row.response,
            tokens_used: row.tokens_used,
            approved: row.approved,
            created_at: row.created_at,
        }
    }
}

pub struct PgAiContentRepository {
    pool: PgPool,
}

impl PgAiContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AiContentRepository for PgAiContentRepository {
    async fn create(&self, content: &AiGeneratedContent) -> Result<AiGeneratedContent, DomainError> {
        let row: ContentRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO ai_generated_contents ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {cols}
            "#,
            cols = CONTENT_COLUMNS
        ))
        .bind(content.id)
        .bind(content.org_id)
        .bind(content.user_id)
        .bind(content.content_type.as_str())
        .bind(&content.prompt)
        .bind(&content.response)
        .bind(content.tokens_used)
        .bind(content.approved)
        .bind(content.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("saving generated content", e))?;

        Ok(row.into())
    }

    async fn list(
        &self,
        org_id: &Uuid,
        content_type: Option<ContentType>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AiGeneratedContent>, i64), DomainError> {
        let content_type = content_type.map(|t| t.as_str());

        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM ai_generated_contents
            WHERE org_id = $1 AND ($2::TEXT IS NULL OR type = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            CONTENT_COLUMNS
        ))
        .bind(org_id)
        .bind(content_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing generated content", e))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ai_generated_contents WHERE org_id = $1 AND ($2::TEXT IS NULL OR type = $2)",
        )
        .bind(org_id)
        .bind(content_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting generated content", e))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_reset_refills_balance_and_keeps_usage() {
        let set_clause = MONTHLY_RESET_SQL
            .split("SET")
            .nth(1)
            .and_then(|rest| rest.split("WHERE").next())
            .unwrap();
        let assignments: Vec<&str> = set_clause
            .split(',')
            .map(|a| a.split('=').next().unwrap().trim())
            .collect();

        assert_eq!(assignments, vec!["ai_credits", "credit_reset_date", "updated_at"]);
        assert!(!MONTHLY_RESET_SQL.contains("ai_credits_used"));
        assert!(set_clause.contains("ai_credits = $2"));
        assert!(MONTHLY_RESET_SQL.trim_end().ends_with("WHERE id = $1"));
    }
}
