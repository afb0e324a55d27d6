// ============================================================================
// QRest Core - Menu Service
// File: crates/qrest-core/src/services/menu_service.rs
// Description: Menu CRUD, duplication, preview tokens and view analytics
// ============================================================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use qrest_security::JwtService;
use qrest_shared::{Paginated, Pagination};

use crate::domain::{actions, ActivityLog, DailyCount, Menu, MenuSummary, MenuTree, NamedCount, Role};
use crate::error::DomainError;
use crate::repositories::{
    ActivityLogRepository, MenuFilter, MenuRepository, MenuViewRepository, QrCodeRepository,
};
use crate::services::context::Actor;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenu {
    #[validate(length(min = 1, max = 200, message = "Menu name is required"))]
    pub name: String,

    #[validate(length(equal = 2, message = "Locale must be a 2-letter code"))]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenu {
    #[validate(length(min = 1, max = 200, message = "Menu name is required"))]
    pub name: Option<String>,

    #[validate(length(equal = 2, message = "Locale must be a 2-letter code"))]
    pub locale: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewToken {
    pub token: String,
    pub preview_url: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAnalytics {
    pub menu_id: Uuid,
    pub days: i64,
    pub total_views: i64,
    pub view_count: i32,
    pub qr_scan_count: i32,
    pub views_by_type: Vec<NamedCount>,
    pub daily_views: Vec<DailyCount>,
}

pub struct MenuService {
    menus: Arc<dyn MenuRepository>,
    qr_codes: Arc<dyn QrCodeRepository>,
    views: Arc<dyn MenuViewRepository>,
    activity: Arc<dyn ActivityLogRepository>,
    jwt: Arc<JwtService>,
}

impl MenuService {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        qr_codes: Arc<dyn QrCodeRepository>,
        views: Arc<dyn MenuViewRepository>,
        activity: Arc<dyn ActivityLogRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            menus,
            qr_codes,
            views,
            activity,
            jwt,
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        search: Option<String>,
        page: Pagination,
    ) -> Result<Paginated<MenuSummary>, DomainError> {
        let filter = MenuFilter {
            org_id: Some(actor.org_id),
            search: search.filter(|s| !s.trim().is_empty()),
        };
        let (menus, total) = self.menus.list(filter, page).await?;
        Ok(Paginated::new(menus, page, total))
    }

    pub async fn get(&self, actor: &Actor, menu_id: &Uuid) -> Result<MenuTree, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;
        let categories = self.menus.load_categories(&menu.id, false).await?;
        let qr_code = self.qr_codes.find_by_menu(&menu.id).await?;
        Ok(MenuTree {
            menu,
            categories,
            qr_code,
        })
    }

    pub async fn create(&self, actor: &Actor, input: CreateMenu) -> Result<Menu, DomainError> {
        actor.require_role(Role::Editor)?;
        input.validate()?;

        let menu = Menu::new(actor.org_id, &input.name, input.locale.as_deref())?;
        let menu = self.menus.create(&menu).await?;
        self.log(actor, actions::MENU_CREATED, json!({ "menuId": menu.id, "menuName": menu.name }))
            .await?;

        info!("Menu {} created in org {}", menu.id, actor.org_id);
        Ok(menu)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        menu_id: &Uuid,
        input: UpdateMenu,
    ) -> Result<Menu, DomainError> {
        actor.require_role(Role::Editor)?;
        input.validate()?;

        let mut menu = self.owned_menu(actor, menu_id).await?;
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

        let menu = self.menus.update(&menu).await?;
        self.log(actor, actions::MENU_UPDATED, json!({ "menuId": menu.id, "menuName": menu.name }))
            .await?;
        Ok(menu)
    }

    /// Deletes the menu with its categories, items and QR code.
    pub async fn delete(&self, actor: &Actor, menu_id: &Uuid) -> Result<(), DomainError> {
        actor.require_role(Role::Admin)?;
        let menu = self.owned_menu(actor, menu_id).await?;

        self.menus.delete(&menu.id).await?;
        self.log(actor, actions::MENU_DELETED, json!({ "menuId": menu.id, "menuName": menu.name }))
            .await?;

        info!("Menu {} deleted from org {}", menu.id, actor.org_id);
        Ok(())
    }

    /// Copies the menu with all categories and items. The QR code stays with the source.
    pub async fn duplicate(&self, actor: &Actor, menu_id: &Uuid) -> Result<Menu, DomainError> {
        actor.require_role(Role::Editor)?;
        let source = self.owned_menu(actor, menu_id).await?;

        let copy = self.menus.duplicate(&source.id, &source.duplicate()).await?;
        self.log(
            actor,
            actions::MENU_DUPLICATED,
            json!({ "sourceMenuId": source.id, "menuId": copy.id, "menuName": copy.name }),
        )
        .await?;
        Ok(copy)
    }

    /// Any member of the owning organization may preview.
    pub async fn preview_token(&self, actor: &Actor, menu_id: &Uuid) -> Result<PreviewToken, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;

        let token = self
            .jwt
            .generate_preview_token(menu.id, menu.org_id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        Ok(PreviewToken {
            preview_url: format!("/preview/{}?token={}", menu.id, token),
            token,
            expires_in: self.jwt.preview_token_expiry(),
        })
    }

    pub async fn analytics(
        &self,
        actor: &Actor,
        menu_id: &Uuid,
        days: i64,
    ) -> Result<MenuAnalytics, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;
        let days = days.clamp(1, 365);
        let since = Utc::now() - Duration::days(days);

        let views_by_type = self.views.count_by_type(&menu.id, since).await?;
        let daily_views = self.views.daily_counts(&menu.id, since).await?;

        Ok(MenuAnalytics {
            menu_id: menu.id,
            days,
            total_views: views_by_type.iter().map(|v| v.count).sum(),
            view_count: menu.view_count,
            qr_scan_count: menu.qr_scan_count,
            views_by_type,
            daily_views,
        })
    }

    /// Menus of other organizations are reported as missing.
    pub(crate) async fn owned_menu(&self, actor: &Actor, menu_id: &Uuid) -> Result<Menu, DomainError> {
        match self.menus.find_by_id(menu_id).await? {
            Some(menu) if menu.org_id == actor.org_id => Ok(menu),
            _ => Err(DomainError::NotFound("Menu")),
        }
    }

    async fn log(&self, actor: &Actor, action: &str, details: serde_json::Value) -> Result<(), DomainError> {
        self.activity
            .create(&ActivityLog::new(actor.org_id, Some(actor.user_id), action, Some(details)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockActivityLogRepository, MockMenuRepository, MockMenuViewRepository,
        MockQrCodeRepository,
    };
    use qrest_shared::config::JwtSettings;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(&JwtSettings {
            access_secret: "a".repeat(32),
            refresh_secret: "r".repeat(32),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            preview_token_expiry: 86400,
        }))
    }

    fn service(menus: MockMenuRepository, activity: MockActivityLogRepository) -> MenuService {
        MenuService::new(
            Arc::new(menus),
            Arc::new(MockQrCodeRepository::new()),
            Arc::new(MockMenuViewRepository::new()),
            Arc::new(activity),
            jwt(),
        )
    }

    fn editor(org_id: Uuid) -> Actor {
        Actor::new(Uuid::new_v4(), org_id, Role::Editor)
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Viewer);
        let err = service(MockMenuRepository::new(), MockActivityLogRepository::new())
            .create(
                &actor,
                CreateMenu {
                    name: "Lunch".into(),
                    locale: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_defaults_locale_and_logs() {
        let org_id = Uuid::new_v4();
        let mut menus = MockMenuRepository::new();
        menus.expect_create()
            .withf(move |m| m.org_id == org_id && m.locale == "tr")
            .returning(|m| Ok(m.clone()));
        let mut activity = MockActivityLogRepository::new();
        activity.expect_create()
            .withf(|log| log.action == "MENU_CREATED")
            .times(1)
            .returning(|_| Ok(()));

        let menu = service(menus, activity)
            .create(
                &editor(org_id),
                CreateMenu {
                    name: "Lunch".into(),
                    locale: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(menu.name, "Lunch");
        assert!(menu.is_active);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_locale() {
        let err = service(MockMenuRepository::new(), MockActivityLogRepository::new())
            .create(
                &editor(Uuid::new_v4()),
                CreateMenu {
                    name: "Lunch".into(),
                    locale: Some("eng".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_get_other_org_menu_not_found() {
        let mut menus = MockMenuRepository::new();
        menus.expect_find_by_id()
            .returning(|_| Ok(Some(Menu::new(Uuid::new_v4(), "Other", None).unwrap())));
        let err = service(menus, MockActivityLogRepository::new())
            .get(&editor(Uuid::new_v4()), &Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Menu not found");
    }

    #[tokio::test]
    async fn test_editor_cannot_delete() {
        let err = service(MockMenuRepository::new(), MockActivityLogRepository::new())
            .delete(&editor(Uuid::new_v4()), &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_appends_copy_suffix() {
        let org_id = Uuid::new_v4();
        let source = Menu::new(org_id, "Dinner", Some("en")).unwrap();
        let source_id = source.id;
        let mut menus = MockMenuRepository::new();
        menus.expect_find_by_id().returning(move |_| Ok(Some(source.clone())));
        menus.expect_duplicate()
            .withf(move |id, copy| *id == source_id && copy.id != source_id)
            .returning(|_, copy| Ok(copy.clone()));
        let mut activity = MockActivityLogRepository::new();
        activity.expect_create().returning(|_| Ok(()));

        let copy = service(menus, activity)
            .duplicate(&editor(org_id), &source_id)
            .await
            .unwrap();
        assert_eq!(copy.name, "Dinner (Copy)");
        assert_eq!(copy.locale, "en");
    }

    #[tokio::test]
    async fn test_preview_token_round_trips() {
        let org_id = Uuid::new_v4();
        let menu = Menu::new(org_id, "Dinner", None).unwrap();
        let menu_id = menu.id;
        let mut menus = MockMenuRepository::new();
        menus.expect_find_by_id().returning(move |_| Ok(Some(menu.clone())));

        let svc = service(menus, MockActivityLogRepository::new());
        let preview = svc.preview_token(&editor(org_id), &menu_id).await.unwrap();
        assert_eq!(preview.expires_in, 86400);
        assert!(preview.preview_url.starts_with(&format!("/preview/{}?token=", menu_id)));

        let claims = svc.jwt.verify_preview_token(&preview.token).unwrap();
        assert_eq!(claims.menu_id, menu_id);
    }

    #[tokio::test]
    async fn test_viewer_can_preview_own_menu_only() {
        let org_id = Uuid::new_v4();
        let menu = Menu::new(org_id, "Dinner", None).unwrap();
        let menu_id = menu.id;
        let mut menus = MockMenuRepository::new();
        menus.expect_find_by_id().returning(move |_| Ok(Some(menu.clone())));
        let svc = service(menus, MockActivityLogRepository::new());

        let viewer = Actor::new(Uuid::new_v4(), org_id, Role::Viewer);
        let preview = svc.preview_token(&viewer, &menu_id).await.unwrap();
        assert_eq!(svc.jwt.verify_preview_token(&preview.token).unwrap().org_id, org_id);

        let outsider = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let err = svc.preview_token(&outsider, &menu_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
