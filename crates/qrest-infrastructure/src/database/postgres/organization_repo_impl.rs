// ============================================================================
// QRest Infrastructure - PostgreSQL Organization & Membership Repositories
// File: crates/qrest-infrastructure/src/database/postgres/organization_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use qrest_core::domain::{
    MemberWithUser, Membership, MembershipWithOrg, NamedCount, OrgStatus, Organization,
    OrganizationCounts, Plan, Role, User, UserSummary,
};
use qrest_core::error::DomainError;
use qrest_core::repositories::{MembershipRepository, OrganizationFilter, OrganizationRepository};
use qrest_shared::Pagination;

use crate::database::error::map_db_error;

const ORG_COLUMNS: &str = "id, name, slug, plan, status, ai_credits, ai_credits_used, \
                           credit_reset_date, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    slug: String,
    plan: String,
    status: String,
    ai_credits: i32,
    ai_credits_used: i32,
    credit_reset_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            slug: row.slug,
            plan: Plan::from_str(&row.plan).unwrap_or_default(),
            status: OrgStatus::from_str(&row.status).unwrap_or_default(),
            ai_credits: row.ai_credits,
            ai_credits_used: row.ai_credits_used,
            credit_reset_date: row.credit_reset_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NamedCountRow {
    name: String,
    count: i64,
}

impl From<NamedCountRow> for NamedCount {
    fn from(row: NamedCountRow) -> Self {
        NamedCount {
            name: row.name,
            count: row.count,
        }
    }
}

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> =
            sqlx::query_as(&format!("SELECT {} FROM organizations WHERE id = $1", ORG_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding organization", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> =
            sqlx::query_as(&format!("SELECT {} FROM organizations WHERE slug = $1", ORG_COLUMNS))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding organization by slug", e))?;

        Ok(row.map(Into::into))
    }

    async fn create_with_owner(
        &self,
        org: &Organization,
        owner: &User,
        membership: &Membership,
    ) -> Result<(), DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting signup transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, email_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(owner.id)
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .bind(&owner.name)
        .bind(owner.email_verified)
        .bind(owner.created_at)
        .bind(owner.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| match map_db_error("creating owner", e) {
            DomainError::Conflict(_) => DomainError::EmailAlreadyExists(owner.email.clone()),
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO organizations (
                id, name, slug, plan, status, ai_credits, ai_credits_used,
                credit_reset_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.plan.as_str())
        .bind(org.status.as_str())
        .bind(org.ai_credits)
        .bind(org.ai_credits_used)
        .bind(org.credit_reset_date)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| match map_db_error("creating organization", e) {
            DomainError::Conflict(_) => DomainError::SlugAlreadyExists(org.slug.clone()),
            other => other,
        })?;

        sqlx::query(
            "INSERT INTO memberships (id, user_id, org_id, role, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(membership.id)
        .bind(membership.user_id)
        .bind(membership.org_id)
        .bind(membership.role.as_str())
        .bind(membership.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| map_db_error("creating owner membership", e))?;

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing signup", e))?;

        info!("Organization {} created with owner {}", org.slug, owner.email);
        Ok(())
    }

    async fn update(&self, org: &Organization) -> Result<Organization, DomainError> {
        let row: OrganizationRow = sqlx::query_as(&format!(
            r#"
            UPDATE organizations
            SET name = $2, slug = $3, plan = $4, status = $5, ai_credits = $6,
                ai_credits_used = $7, credit_reset_date = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            ORG_COLUMNS
        ))
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.plan.as_str())
        .bind(org.status.as_str())
        .bind(org.ai_credits)
        .bind(org.ai_credits_used)
        .bind(org.credit_reset_date)
        .bind(org.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error("updating organization", e) {
            DomainError::Conflict(_) => DomainError::SlugAlreadyExists(org.slug.clone()),
            other => other,
        })?;

        Ok(row.into())
    }

    async fn list(
        &self,
        filter: OrganizationFilter,
        page: Pagination,
    ) -> Result<(Vec<Organization>, i64), DomainError> {
        let pattern = filter.search.map(|s| format!("%{}%", s.trim()));
        let status = filter.status.map(|s| s.as_str());
        let plan = filter.plan.map(|p| p.as_str());
        let condition = r#"
            ($1::TEXT IS NULL OR name ILIKE $1 OR slug ILIKE $1)
            AND ($2::TEXT IS NULL OR status = $2)
            AND ($3::TEXT IS NULL OR plan = $3)
        "#;

        let rows: Vec<OrganizationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM organizations WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            ORG_COLUMNS, condition
        ))
        .bind(&pattern)
        .bind(status)
        .bind(plan)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing organizations", e))?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM organizations WHERE {}", condition))
                .bind(&pattern)
                .bind(status)
                .bind(plan)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_db_error("counting organizations", e))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn counts(&self, id: &Uuid) -> Result<OrganizationCounts, DomainError> {
        let (members, menus): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM memberships WHERE org_id = $1),
                (SELECT COUNT(*) FROM menus WHERE org_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting organization members and menus", e))?;

        Ok(OrganizationCounts { members, menus })
    }

    async fn count(&self, status: Option<OrgStatus>) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE $1::TEXT IS NULL OR status = $1")
            .bind(status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting organizations", e))
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting recent organizations", e))
    }

    async fn count_by_plan(&self) -> Result<Vec<NamedCount>, DomainError> {
        let rows: Vec<NamedCountRow> = sqlx::query_as(
            "SELECT plan AS name, COUNT(*) AS count FROM organizations GROUP BY plan ORDER BY plan",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("grouping organizations by plan", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_on_plan(&self, plan_name: &str) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE plan = $1")
            .bind(plan_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting organizations on plan", e))
    }

    async fn find_due_for_credit_reset(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Organization>, DomainError> {
        let rows: Vec<OrganizationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM organizations
            WHERE status = 'ACTIVE' AND credit_reset_date IS NOT NULL AND credit_reset_date <= $1
            "#,
            ORG_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("finding organizations due for credit reset", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ----------------------------------------------------------------------------
// Memberships
// ----------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    user_id: Uuid,
    org_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            id: row.id,
            user_id: row.user_id,
            org_id: row.org_id,
            role: Role::from_str(&row.role).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MembershipWithOrgRow {
    org_id: Uuid,
    org_name: String,
    org_slug: String,
    plan: String,
    status: String,
    role: String,
}

impl From<MembershipWithOrgRow> for MembershipWithOrg {
    fn from(row: MembershipWithOrgRow) -> Self {
        MembershipWithOrg {
            org_id: row.org_id,
            org_name: row.org_name,
            org_slug: row.org_slug,
            plan: Plan::from_str(&row.plan).unwrap_or_default(),
            status: OrgStatus::from_str(&row.status).unwrap_or_default(),
            role: Role::from_str(&row.role).unwrap_or_default(),
        }
    }
}

#[derive(Debug, FromRow)]
struct MemberWithUserRow {
    id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    user_name: Option<String>,
    user_email: String,
}

impl From<MemberWithUserRow> for MemberWithUser {
    fn from(row: MemberWithUserRow) -> Self {
        MemberWithUser {
            id: row.id,
            role: Role::from_str(&row.role).unwrap_or_default(),
            joined_at: row.created_at,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
        }
    }
}

const MEMBERSHIP_COLUMNS: &str = "id, user_id, org_id, role, created_at";

pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn find(&self, user_id: &Uuid, org_id: &Uuid) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE user_id = $1 AND org_id = $2",
            MEMBERSHIP_COLUMNS
        ))
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding membership", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> =
            sqlx::query_as(&format!("SELECT {} FROM memberships WHERE id = $1", MEMBERSHIP_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding membership by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn first_for_user(&self, user_id: &Uuid) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE user_id = $1 ORDER BY created_at ASC LIMIT 1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding first membership", e))?;

        Ok(row.map(Into::into))
    }

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<MembershipWithOrg>, DomainError> {
        let rows: Vec<MembershipWithOrgRow> = sqlx::query_as(
            r#"
            SELECT o.id AS org_id, o.name AS org_name, o.slug AS org_slug,
                   o.plan, o.status, m.role
            FROM memberships m
            JOIN organizations o ON o.id = m.org_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing user memberships", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_members(&self, org_id: &Uuid) -> Result<Vec<MemberWithUser>, DomainError> {
        let rows: Vec<MemberWithUserRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.role, m.created_at,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.org_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing organization members", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let row: MembershipRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO memberships (id, user_id, org_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        ))
        .bind(membership.id)
        .bind(membership.user_id)
        .bind(membership.org_id)
        .bind(membership.role.as_str())
        .bind(membership.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating membership", e))?;

        Ok(row.into())
    }

    async fn update_role(&self, id: &Uuid, role: Role) -> Result<Membership, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "UPDATE memberships SET role = $2 WHERE id = $1 RETURNING {}",
            MEMBERSHIP_COLUMNS
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating member role", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Team member"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting membership", e))?;

        Ok(result.rows_affected() > 0)
    }
}
