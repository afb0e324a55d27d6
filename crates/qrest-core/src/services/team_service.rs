//! Team membership management

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use qrest_shared::utils::normalize_email;

use crate::domain::{actions, ActivityLog, MemberWithUser, Membership, Role};
use crate::error::DomainError;
use crate::repositories::{ActivityLogRepository, MembershipRepository, UserRepository};
use crate::services::context::require_membership;

pub struct TeamService {
    users: Arc<dyn UserRepository>,
    memberships: Arc<dyn MembershipRepository>,
    activity: Arc<dyn ActivityLogRepository>,
}

impl TeamService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        memberships: Arc<dyn MembershipRepository>,
        activity: Arc<dyn ActivityLogRepository>,
    ) -> Self {
        Self {
            users,
            memberships,
            activity,
        }
    }

    pub async fn list_members(
        &self,
        requester_id: &Uuid,
        org_id: &Uuid,
    ) -> Result<Vec<MemberWithUser>, DomainError> {
        require_membership(self.memberships.as_ref(), requester_id, org_id).await?;
        self.memberships.list_members(org_id).await
    }

    /// Add an existing user to the organization.
    pub async fn invite(
        &self,
        requester_id: &Uuid,
        org_id: &Uuid,
        email: &str,
        role: Role,
    ) -> Result<MemberWithUser, DomainError> {
        if !role.is_assignable() {
            return Err(DomainError::ValidationError("Invalid role".into()));
        }
        self.require_manager(requester_id, org_id, "Only owners and admins can invite members")
            .await?;

        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::NotFound("User"))?;

        if self.memberships.find(&user.id, org_id).await?.is_some() {
            return Err(DomainError::ValidationError(
                "User is already a member of this organization".into(),
            ));
        }

        let membership = self
            .memberships
            .create(&Membership::new(user.id, *org_id, role))
            .await?;

        self.activity
            .create(&ActivityLog::new(
                *org_id,
                Some(*requester_id),
                actions::TEAM_MEMBER_ADDED,
                Some(json!({ "invitedEmail": email, "role": role.as_str() })),
            ))
            .await?;

        info!("User {} added to org {} as {}", user.id, org_id, role.as_str());

        Ok(MemberWithUser {
            id: membership.id,
            role: membership.role,
            joined_at: membership.created_at,
            user: user.summary(),
        })
    }

    pub async fn update_role(
        &self,
        requester_id: &Uuid,
        org_id: &Uuid,
        member_id: &Uuid,
        role: Role,
    ) -> Result<MemberWithUser, DomainError> {
        if !role.is_assignable() {
            return Err(DomainError::ValidationError("Invalid role".into()));
        }
        self.require_manager(requester_id, org_id, "Only owners and admins can update member roles")
            .await?;

        let member = self.member_in_org(member_id, org_id).await?;
        if member.is_owner() {
            return Err(DomainError::ValidationError("Cannot change owner role".into()));
        }

        let user = self
            .users
            .find_by_id(&member.user_id)
            .await?
            .ok_or(DomainError::NotFound("Team member"))?;
        let updated = self.memberships.update_role(member_id, role).await?;

        self.activity
            .create(&ActivityLog::new(
                *org_id,
                Some(*requester_id),
                actions::TEAM_MEMBER_ROLE_UPDATED,
                Some(json!({
                    "memberEmail": user.email,
                    "oldRole": member.role.as_str(),
                    "newRole": role.as_str(),
                })),
            ))
            .await?;

        Ok(MemberWithUser {
            id: updated.id,
            role: updated.role,
            joined_at: updated.created_at,
            user: user.summary(),
        })
    }

    pub async fn remove(
        &self,
        requester_id: &Uuid,
        org_id: &Uuid,
        member_id: &Uuid,
    ) -> Result<(), DomainError> {
        self.require_manager(requester_id, org_id, "Only owners and admins can remove members")
            .await?;

        let member = self.member_in_org(member_id, org_id).await?;
        if member.is_owner() {
            return Err(DomainError::ValidationError(
                "Cannot remove organization owner".into(),
            ));
        }
        if &member.user_id == requester_id {
            return Err(DomainError::ValidationError(
                "Cannot remove yourself. Transfer ownership first".into(),
            ));
        }

        let email = self
            .users
            .find_by_id(&member.user_id)
            .await?
            .map(|u| u.email)
            .unwrap_or_default();
        self.memberships.delete(member_id).await?;

        self.activity
            .create(&ActivityLog::new(
                *org_id,
                Some(*requester_id),
                actions::TEAM_MEMBER_REMOVED,
                Some(json!({ "memberEmail": email, "role": member.role.as_str() })),
            ))
            .await?;

        info!("Member {} removed from org {}", member_id, org_id);
        Ok(())
    }

    async fn require_manager(
        &self,
        requester_id: &Uuid,
        org_id: &Uuid,
        message: &str,
    ) -> Result<Membership, DomainError> {
        let membership = self.memberships.find(requester_id, org_id).await?;
        match membership {
            Some(m) if m.role.at_least(Role::Admin) => Ok(m),
            _ => {
                warn!("User {} denied team management in org {}", requester_id, org_id);
                Err(DomainError::Forbidden(message.to_string()))
            }
        }
    }

    async fn member_in_org(&self, member_id: &Uuid, org_id: &Uuid) -> Result<Membership, DomainError> {
        match self.memberships.find_by_id(member_id).await? {
            Some(m) if &m.org_id == org_id => Ok(m),
            _ => Err(DomainError::NotFound("Team member")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::repositories::{
        MockActivityLogRepository, MockMembershipRepository, MockUserRepository,
    };

    fn service(
        users: MockUserRepository,
        memberships: MockMembershipRepository,
        activity: MockActivityLogRepository,
    ) -> TeamService {
        TeamService::new(Arc::new(users), Arc::new(memberships), Arc::new(activity))
    }

    #[tokio::test]
    async fn test_list_members_requires_membership() {
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find().returning(|_, _| Ok(None));
        let err = service(MockUserRepository::new(), memberships, MockActivityLogRepository::new())
            .list_members(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_editor_cannot_invite() {
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find()
            .returning(|u, o| Ok(Some(Membership::new(*u, *o, Role::Editor))));
        let err = service(MockUserRepository::new(), memberships, MockActivityLogRepository::new())
            .invite(&Uuid::new_v4(), &Uuid::new_v4(), "x@demo.com", Role::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_invite_owner_role_rejected() {
        let err = service(
            MockUserRepository::new(),
            MockMembershipRepository::new(),
            MockActivityLogRepository::new(),
        )
        .invite(&Uuid::new_v4(), &Uuid::new_v4(), "x@demo.com", Role::Owner)
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid role");
    }

    #[tokio::test]
    async fn test_invite_adds_member_and_logs() {
        let requester = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let invited = User::new("new@demo.com", "hash".into(), Some("New".into())).unwrap();
        let invited_id = invited.id;

        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |_| Ok(Some(invited.clone())));
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find().returning(move |user_id, org| {
            if *user_id == requester {
                Ok(Some(Membership::new(requester, *org, Role::Admin)))
            } else {
                Ok(None)
            }
        });
        memberships.expect_create()
            .withf(move |m| m.user_id == invited_id && m.role == Role::Editor)
            .returning(|m| Ok(m.clone()));
        let mut activity = MockActivityLogRepository::new();
        activity.expect_create()
            .withf(|log| log.action == "TEAM_MEMBER_ADDED")
            .times(1)
            .returning(|_| Ok(()));

        let member = service(users, memberships, activity)
            .invite(&requester, &org_id, "New@Demo.com", Role::Editor)
            .await
            .unwrap();
        assert_eq!(member.role, Role::Editor);
        assert_eq!(member.user.email, "new@demo.com");
    }

    #[tokio::test]
    async fn test_cannot_remove_owner() {
        let requester = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find()
            .returning(|u, o| Ok(Some(Membership::new(*u, *o, Role::Admin))));
        memberships.expect_find_by_id()
            .returning(move |_| Ok(Some(Membership::new_owner(Uuid::new_v4(), org_id))));

        let err = service(MockUserRepository::new(), memberships, MockActivityLogRepository::new())
            .remove(&requester, &org_id, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot remove organization owner");
    }

    #[tokio::test]
    async fn test_cannot_remove_self() {
        let requester = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find()
            .returning(|u, o| Ok(Some(Membership::new(*u, *o, Role::Admin))));
        memberships.expect_find_by_id()
            .returning(move |_| Ok(Some(Membership::new(requester, org_id, Role::Admin))));

        let err = service(MockUserRepository::new(), memberships, MockActivityLogRepository::new())
            .remove(&requester, &org_id, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Cannot remove yourself"));
    }

    #[tokio::test]
    async fn test_member_from_other_org_not_found() {
        let org_id = Uuid::new_v4();
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find()
            .returning(|u, o| Ok(Some(Membership::new(*u, *o, Role::Owner))));
        memberships.expect_find_by_id()
            .returning(|_| Ok(Some(Membership::new(Uuid::new_v4(), Uuid::new_v4(), Role::Viewer))));

        let err = service(MockUserRepository::new(), memberships, MockActivityLogRepository::new())
            .update_role(&Uuid::new_v4(), &org_id, &Uuid::new_v4(), Role::Editor)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Team member not found");
    }
}
