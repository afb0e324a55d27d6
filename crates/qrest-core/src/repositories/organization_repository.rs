//! Organization and membership repository traits (ports)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use qrest_shared::Pagination;

use crate::domain::{
    MemberWithUser, Membership, MembershipWithOrg, NamedCount, OrgStatus, Organization,
    OrganizationCounts, Plan, Role, User,
};
use crate::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationFilter {
    pub search: Option<String>,
    pub status: Option<OrgStatus>,
    pub plan: Option<Plan>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, DomainError>;
    /// Creates the organization, its owner and the OWNER membership in one transaction.
    async fn create_with_owner(
        &self,
        org: &Organization,
        owner: &User,
        membership: &Membership,
    ) -> Result<(), DomainError>;
    async fn update(&self, org: &Organization) -> Result<Organization, DomainError>;
    async fn list(
        &self,
        filter: OrganizationFilter,
        page: Pagination,
    ) -> Result<(Vec<Organization>, i64), DomainError>;
    async fn counts(&self, id: &Uuid) -> Result<OrganizationCounts, DomainError>;
    async fn count(&self, status: Option<OrgStatus>) -> Result<i64, DomainError>;
    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, DomainError>;
    async fn count_by_plan(&self) -> Result<Vec<NamedCount>, DomainError>;
    async fn count_on_plan(&self, plan_name: &str) -> Result<i64, DomainError>;
    /// Active organizations whose credit reset date is at or before `now`.
    async fn find_due_for_credit_reset(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Organization>, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find(&self, user_id: &Uuid, org_id: &Uuid) -> Result<Option<Membership>, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Membership>, DomainError>;
    /// Oldest membership of the user; this is the organization put in tokens.
    async fn first_for_user(&self, user_id: &Uuid) -> Result<Option<Membership>, DomainError>;
    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<MembershipWithOrg>, DomainError>;
    async fn list_members(&self, org_id: &Uuid) -> Result<Vec<MemberWithUser>, DomainError>;
    async fn create(&self, membership: &Membership) -> Result<Membership, DomainError>;
    async fn update_role(&self, id: &Uuid, role: Role) -> Result<Membership, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
}
