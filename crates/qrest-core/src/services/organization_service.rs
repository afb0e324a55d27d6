//! Current-organization operations for the token organization

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use qrest_shared::utils::SLUG_REGEX;

use crate::domain::{MemberWithUser, Organization, OrganizationCounts, Role, ThemeSetting};
use crate::error::DomainError;
use crate::repositories::{MembershipRepository, OrganizationRepository, ThemeRepository};
use crate::services::context::Actor;
use crate::services::team_service::TeamService;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetails {
    #[serde(flatten)]
    pub organization: Organization,
    pub counts: OrganizationCounts,
    pub theme: Option<ThemeSetting>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    #[validate(length(min = 1, max = 100, message = "Organization name is required"))]
    pub name: Option<String>,

    #[validate(
        length(min = 3, max = 60, message = "Slug must be at least 3 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must contain only lowercase letters, numbers, and hyphens")
    )]
    pub slug: Option<String>,
}

pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
    memberships: Arc<dyn MembershipRepository>,
    themes: Arc<dyn ThemeRepository>,
    team: Arc<TeamService>,
}

impl OrganizationService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        themes: Arc<dyn ThemeRepository>,
        team: Arc<TeamService>,
    ) -> Self {
        Self {
            organizations,
            memberships,
            themes,
            team,
        }
    }

    pub async fn current(&self, actor: &Actor) -> Result<OrganizationDetails, DomainError> {
        let organization = self
            .organizations
            .find_by_id(&actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))?;
        let counts = self.organizations.counts(&organization.id).await?;
        let theme = self.themes.find_by_org(&organization.id).await?;

        Ok(OrganizationDetails {
            organization,
            counts,
            theme,
        })
    }

    /// Same as [`current`](Self::current) but checks the path id against the token.
    pub async fn get_by_id(&self, actor: &Actor, org_id: &Uuid) -> Result<OrganizationDetails, DomainError> {
        actor.require_org(org_id)?;
        self.current(actor).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        input: UpdateOrganization,
    ) -> Result<Organization, DomainError> {
        actor.require_role(Role::Owner)?;
        input.validate()?;

        let mut organization = self
            .organizations
            .find_by_id(&actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))?;

        if let Some(slug) = input.slug {
            if slug != organization.slug {
                if self.organizations.find_by_slug(&slug).await?.is_some() {
                    return Err(DomainError::SlugAlreadyExists(slug));
                }
                organization.slug = slug;
            }
        }
        if let Some(name) = input.name {
            organization.name = name.trim().to_string();
        }
        organization.touch();

        let updated = self.organizations.update(&organization).await?;
        info!("Organization {} updated by {}", updated.id, actor.user_id);
        Ok(updated)
    }

    pub async fn update_by_id(
        &self,
        actor: &Actor,
        org_id: &Uuid,
        input: UpdateOrganization,
    ) -> Result<Organization, DomainError> {
        actor.require_org(org_id)?;
        self.update(actor, input).await
    }

    pub async fn members(&self, actor: &Actor) -> Result<Vec<MemberWithUser>, DomainError> {
        self.memberships.list_members(&actor.org_id).await
    }

    /// Change a member's role, addressed by user id.
    pub async fn update_member_role(
        &self,
        actor: &Actor,
        user_id: &Uuid,
        role: Role,
    ) -> Result<MemberWithUser, DomainError> {
        actor.require_role(Role::Owner)?;
        let membership = self
            .memberships
            .find(user_id, &actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Team member"))?;
        self.team
            .update_role(&actor.user_id, &actor.org_id, &membership.id, role)
            .await
    }

    pub async fn remove_member(&self, actor: &Actor, user_id: &Uuid) -> Result<(), DomainError> {
        actor.require_role(Role::Admin)?;
        let membership = self
            .memberships
            .find(user_id, &actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Team member"))?;
        self.team
            .remove(&actor.user_id, &actor.org_id, &membership.id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Membership;
    use crate::repositories::{
        MockActivityLogRepository, MockMembershipRepository, MockOrganizationRepository,
        MockThemeRepository, MockUserRepository,
    };

    fn service(
        organizations: MockOrganizationRepository,
        memberships: MockMembershipRepository,
    ) -> OrganizationService {
        let memberships = Arc::new(memberships);
        let team = Arc::new(TeamService::new(
            Arc::new(MockUserRepository::new()),
            memberships.clone(),
            Arc::new(MockActivityLogRepository::new()),
        ));
        OrganizationService::new(
            Arc::new(organizations),
            memberships,
            Arc::new(MockThemeRepository::new()),
            team,
        )
    }

    #[tokio::test]
    async fn test_get_by_id_other_org_forbidden() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let err = service(MockOrganizationRepository::new(), MockMembershipRepository::new())
            .get_by_id(&actor, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Admin);
        let err = service(MockOrganizationRepository::new(), MockMembershipRepository::new())
            .update(&actor, UpdateOrganization::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_slug_conflict() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let actor = Actor::new(Uuid::new_v4(), org.id, Role::Owner);
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        organizations.expect_find_by_slug()
            .returning(|_| Ok(Some(Organization::new("Other", "taken").unwrap())));

        let err = service(organizations, MockMembershipRepository::new())
            .update(
                &actor,
                UpdateOrganization {
                    name: None,
                    slug: Some("taken".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Organization slug already taken");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_slug() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let err = service(MockOrganizationRepository::new(), MockMembershipRepository::new())
            .update(
                &actor,
                UpdateOrganization {
                    name: None,
                    slug: Some("Bad Slug".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_member_role_cannot_touch_owner() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let owner_id = actor.user_id;
        let org_id = actor.org_id;
        let owner = Membership::new_owner(owner_id, org_id);
        let owner_membership_id = owner.id;

        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find().returning(move |_, _| Ok(Some(owner.clone())));
        memberships.expect_find_by_id()
            .withf(move |id| *id == owner_membership_id)
            .returning(move |_| Ok(Some(Membership {
                id: owner_membership_id,
                ..Membership::new_owner(owner_id, org_id)
            })));

        let err = service(MockOrganizationRepository::new(), memberships)
            .update_member_role(&actor, &owner_id, Role::Editor)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change owner role");
    }
}
