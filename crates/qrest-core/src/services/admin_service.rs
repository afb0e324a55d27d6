// ============================================================================
// QRest Core - Admin Service
// File: crates/qrest-core/src/services/admin_service.rs
// Description: Platform administration of organizations, users and menus
// ============================================================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use qrest_shared::constants::RECENT_WINDOW_DAYS;
use qrest_shared::{Paginated, Pagination};

use crate::domain::{
    MembershipWithOrg, Menu, MenuSummary, MenuTree, NamedCount, OrgStatus, Organization,
    OrganizationCounts, Plan, User,
};
use crate::error::DomainError;
use crate::repositories::{
    MembershipRepository, MenuFilter, MenuRepository, MenuViewRepository, OrganizationFilter,
    OrganizationRepository, QrCodeRepository, UserRepository,
};
use crate::services::menu_service::UpdateMenu;

const MENU_STATS_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateOrganization {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub plan: Option<Plan>,
    pub status: Option<OrgStatus>,
    pub ai_credits: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUser {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub email_verified: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrganization {
    #[serde(flatten)]
    pub organization: Organization,
    pub counts: OrganizationCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(flatten)]
    pub user: User,
    pub organizations: Vec<MembershipWithOrg>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_organizations: i64,
    pub active_organizations: i64,
    pub total_users: i64,
    pub total_menus: i64,
    pub recent_signups: i64,
    pub organizations_by_plan: Vec<NamedCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminMenuStats {
    pub menu_id: Uuid,
    pub view_count: i32,
    pub qr_scan_count: i32,
    pub categories: usize,
    pub items: usize,
    pub has_qr_code: bool,
    pub views_by_type: Vec<NamedCount>,
}

pub struct AdminService {
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    memberships: Arc<dyn MembershipRepository>,
    menus: Arc<dyn MenuRepository>,
    qr_codes: Arc<dyn QrCodeRepository>,
    views: Arc<dyn MenuViewRepository>,
}

impl AdminService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        memberships: Arc<dyn MembershipRepository>,
        menus: Arc<dyn MenuRepository>,
        qr_codes: Arc<dyn QrCodeRepository>,
        views: Arc<dyn MenuViewRepository>,
    ) -> Self {
        Self {
            organizations,
            users,
            memberships,
            menus,
            qr_codes,
            views,
        }
    }

    // ------------------------------------------------------------------
    // Organizations
    // ------------------------------------------------------------------

    pub async fn list_organizations(
        &self,
        filter: OrganizationFilter,
        page: Pagination,
    ) -> Result<Paginated<Organization>, DomainError> {
        let (orgs, total) = self.organizations.list(filter, page).await?;
        Ok(Paginated::new(orgs, page, total))
    }

    pub async fn get_organization(&self, id: &Uuid) -> Result<AdminOrganization, DomainError> {
        let organization = self.organization(id).await?;
        let counts = self.organizations.counts(id).await?;
        Ok(AdminOrganization {
            organization,
            counts,
        })
    }

    pub async fn update_organization(
        &self,
        id: &Uuid,
        input: AdminUpdateOrganization,
    ) -> Result<Organization, DomainError> {
        let mut org = self.organization(id).await?;

        if let Some(slug) = input.slug {
            if slug != org.slug {
                if self.organizations.find_by_slug(&slug).await?.is_some() {
                    return Err(DomainError::SlugAlreadyExists(slug));
                }
                org.slug = slug;
            }
        }
        if let Some(name) = input.name {
            org.name = name.trim().to_string();
        }
        if let Some(plan) = input.plan {
            org.plan = plan;
        }
        if let Some(status) = input.status {
            org.status = status;
        }
        if let Some(credits) = input.ai_credits {
            if credits < 0 {
                return Err(DomainError::ValidationError(
                    "aiCredits: Credits cannot be negative".into(),
                ));
            }
            org.ai_credits = credits;
        }
        org.validate()?;
        org.touch();

        let org = self.organizations.update(&org).await?;
        info!("Admin updated organization {}", org.id);
        Ok(org)
    }

    pub async fn set_organization_status(&self, id: &Uuid, status: OrgStatus) -> Result<Organization, DomainError> {
        let mut org = self.organization(id).await?;
        org.status = status;
        org.touch();
        let org = self.organizations.update(&org).await?;
        info!("Organization {} status set to {}", org.id, status.as_str());
        Ok(org)
    }

    pub async fn set_organization_plan(&self, id: &Uuid, plan: Plan) -> Result<Organization, DomainError> {
        let mut org = self.organization(id).await?;
        org.plan = plan;
        org.touch();
        let org = self.organizations.update(&org).await?;
        info!("Organization {} moved to plan {}", org.id, plan.as_str());
        Ok(org)
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, DomainError> {
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        Ok(PlatformStats {
            total_organizations: self.organizations.count(None).await?,
            active_organizations: self.organizations.count(Some(OrgStatus::Active)).await?,
            total_users: self.users.count().await?,
            total_menus: self.menus.count(None).await?,
            recent_signups: self.organizations.count_created_since(since).await?,
            organizations_by_plan: self.organizations.count_by_plan().await?,
        })
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn list_users(&self, search: Option<String>, page: Pagination) -> Result<Paginated<User>, DomainError> {
        let search = search.filter(|s| !s.trim().is_empty());
        let (users, total) = self.users.list(search, page).await?;
        Ok(Paginated::new(users, page, total))
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<AdminUser, DomainError> {
        let user = self.user(id).await?;
        let organizations = self.memberships.list_for_user(id).await?;
        Ok(AdminUser {
            user,
            organizations,
        })
    }

    pub async fn update_user(&self, id: &Uuid, input: AdminUpdateUser) -> Result<User, DomainError> {
        input.validate()?;
        let mut user = self.user(id).await?;
        if let Some(name) = input.name {
            user.name = Some(name.trim().to_string());
        }
        if let Some(verified) = input.email_verified {
            user.email_verified = verified;
        }
        user.updated_at = Utc::now();
        self.users.update(&user).await
    }

    pub async fn delete_user(&self, id: &Uuid) -> Result<(), DomainError> {
        if !self.users.delete(id).await? {
            return Err(DomainError::NotFound("User"));
        }
        info!("Admin deleted user {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Menus
    // ------------------------------------------------------------------

    pub async fn list_menus(&self, filter: MenuFilter, page: Pagination) -> Result<Paginated<MenuSummary>, DomainError> {
        let (menus, total) = self.menus.list(filter, page).await?;
        Ok(Paginated::new(menus, page, total))
    }

    pub async fn get_menu(&self, id: &Uuid) -> Result<MenuTree, DomainError> {
        let menu = self.menu(id).await?;
        let categories = self.menus.load_categories(id, false).await?;
        let qr_code = self.qr_codes.find_by_menu(id).await?;
        Ok(MenuTree {
            menu,
            categories,
            qr_code,
        })
    }

    pub async fn update_menu(&self, id: &Uuid, input: UpdateMenu) -> Result<Menu, DomainError> {
        input.validate()?;
        let mut menu = self.menu(id).await?;
        if let Some(name) = input.name {
            menu.name = name.trim().to_string();
        }
        if let Some(locale) = input.locale {
            menu.locale = locale.to_lowercase();
        }
        if let Some(is_active) = input.is_active {
            menu.is_active = is_active;
        }
        menu.updated_at = Utc::now();
        self.menus.update(&menu).await
    }

    pub async fn delete_menu(&self, id: &Uuid) -> Result<(), DomainError> {
        if !self.menus.delete(id).await? {
            return Err(DomainError::NotFound("Menu"));
        }
        info!("Admin deleted menu {}", id);
        Ok(())
    }

    pub async fn menu_stats(&self, id: &Uuid) -> Result<AdminMenuStats, DomainError> {
        let menu = self.menu(id).await?;
        let categories = self.menus.load_categories(id, false).await?;
        let since = Utc::now() - Duration::days(MENU_STATS_DAYS);

        Ok(AdminMenuStats {
            menu_id: menu.id,
            view_count: menu.view_count,
            qr_scan_count: menu.qr_scan_count,
            categories: categories.len(),
            items: categories.iter().map(|c| c.items.len()).sum(),
            has_qr_code: self.qr_codes.find_by_menu(id).await?.is_some(),
            views_by_type: self.views.count_by_type(id, since).await?,
        })
    }

    async fn organization(&self, id: &Uuid) -> Result<Organization, DomainError> {
        self.organizations
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))
    }

    async fn user(&self, id: &Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id).await?.ok_or(DomainError::NotFound("User"))
    }

    async fn menu(&self, id: &Uuid) -> Result<Menu, DomainError> {
        self.menus.find_by_id(id).await?.ok_or(DomainError::NotFound("Menu"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockMembershipRepository, MockMenuRepository, MockMenuViewRepository,
        MockOrganizationRepository, MockQrCodeRepository, MockUserRepository,
    };

    fn service(organizations: MockOrganizationRepository, users: MockUserRepository, menus: MockMenuRepository) -> AdminService {
        AdminService::new(
            Arc::new(organizations),
            Arc::new(users),
            Arc::new(MockMembershipRepository::new()),
            Arc::new(menus),
            Arc::new(MockQrCodeRepository::new()),
            Arc::new(MockMenuViewRepository::new()),
        )
    }

    #[tokio::test]
    async fn test_platform_stats() {
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_count()
            .returning(|status| Ok(if status.is_some() { 8 } else { 10 }));
        organizations.expect_count_created_since().returning(|_| Ok(2));
        organizations.expect_count_by_plan()
            .returning(|| Ok(vec![NamedCount { name: "FREE".into(), count: 10 }]));
        let mut users = MockUserRepository::new();
        users.expect_count().returning(|| Ok(25));
        let mut menus = MockMenuRepository::new();
        menus.expect_count().withf(|org| org.is_none()).returning(|_| Ok(14));

        let stats = service(organizations, users, menus).platform_stats().await.unwrap();
        assert_eq!(stats.total_organizations, 10);
        assert_eq!(stats.active_organizations, 8);
        assert_eq!(stats.total_users, 25);
        assert_eq!(stats.total_menus, 14);
        assert_eq!(stats.recent_signups, 2);
    }

    #[tokio::test]
    async fn test_update_organization_rejects_negative_credits() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));

        let err = service(organizations, MockUserRepository::new(), MockMenuRepository::new())
            .update_organization(
                &Uuid::new_v4(),
                AdminUpdateOrganization {
                    ai_credits: Some(-5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_set_status_persists() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        organizations.expect_update()
            .withf(|o| o.status == OrgStatus::Suspended)
            .returning(|o| Ok(o.clone()));

        let org = service(organizations, MockUserRepository::new(), MockMenuRepository::new())
            .set_organization_status(&Uuid::new_v4(), OrgStatus::Suspended)
            .await
            .unwrap();
        assert!(!org.is_active());
    }

    #[tokio::test]
    async fn test_delete_missing_user_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_delete().returning(|_| Ok(false));
        let err = service(MockOrganizationRepository::new(), users, MockMenuRepository::new())
            .delete_user(&Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }
}
