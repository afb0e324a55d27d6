//! Request actor and membership checks shared by services

use uuid::Uuid;

use crate::domain::{Membership, Role};
use crate::error::DomainError;
use crate::repositories::MembershipRepository;

/// The authenticated caller acting inside their token organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, org_id: Uuid, role: Role) -> Self {
        Self { user_id, org_id, role }
    }

    pub fn require_role(&self, required: Role) -> Result<(), DomainError> {
        if self.role.at_least(required) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "Insufficient permissions. Minimum required role: {}",
                required.as_str()
            )))
        }
    }

    /// Fails unless `org_id` is the actor's own organization.
    pub fn require_org(&self, org_id: &Uuid) -> Result<(), DomainError> {
        if &self.org_id == org_id {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "You do not have access to this organization".into(),
            ))
        }
    }
}

pub(crate) async fn require_membership(
    memberships: &dyn MembershipRepository,
    user_id: &Uuid,
    org_id: &Uuid,
) -> Result<Membership, DomainError> {
    memberships
        .find(user_id, org_id)
        .await?
        .ok_or_else(|| DomainError::Forbidden("You do not have access to this organization".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_role() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        assert!(actor.require_role(Role::Viewer).is_ok());
        assert!(actor.require_role(Role::Editor).is_ok());
        let err = actor.require_role(Role::Admin).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient permissions. Minimum required role: ADMIN"
        );
    }

    #[test]
    fn test_require_org() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        assert!(actor.require_org(&actor.org_id).is_ok());
        assert!(matches!(
            actor.require_org(&Uuid::new_v4()),
            Err(DomainError::Forbidden(_))
        ));
    }
}
