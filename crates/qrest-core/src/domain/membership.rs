// ============================================================================
// QRest Core - Membership Entity
// File: crates/qrest-core/src/domain/membership.rs
// Description: User-Organization relationship with roles
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::organization::{OrgStatus, Plan};
use super::user::UserSummary;

/// Organization role. Declaration order is the permission order, so
/// `Role::Viewer < Role::Editor < Role::Admin < Role::Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "VIEWER" => Some(Role::Viewer),
            "EDITOR" => Some(Role::Editor),
            "ADMIN" => Some(Role::Admin),
            "OWNER" => Some(Role::Owner),
            _ => None,
        }
    }

    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Roles that can be handed out through invites and role changes.
    pub fn is_assignable(&self) -> bool {
        *self != Role::Owner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: Uuid, org_id: Uuid, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            org_id,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn new_owner(user_id: Uuid, org_id: Uuid) -> Self {
        Self::new(user_id, org_id, Role::Owner)
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// A membership joined with the member's user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    pub id: Uuid,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// A membership joined with the organization it grants access to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipWithOrg {
    pub org_id: Uuid,
    pub org_name: String,
    pub org_slug: String,
    pub plan: Plan,
    pub status: OrgStatus,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
        assert!(Role::Admin < Role::Owner);
        assert!(Role::Owner.at_least(Role::Admin));
        assert!(Role::Editor.at_least(Role::Editor));
        assert!(!Role::Viewer.at_least(Role::Editor));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::from_str("EDITOR"), Some(Role::Editor));
        assert_eq!(Role::from_str("editor"), None);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ADMIN");
    }

    #[test]
    fn test_owner_not_assignable() {
        assert!(!Role::Owner.is_assignable());
        assert!(Role::Admin.is_assignable());
    }

    #[test]
    fn test_new_owner() {
        let m = Membership::new_owner(Uuid::new_v4(), Uuid::new_v4());
        assert!(m.is_owner());
    }
}
