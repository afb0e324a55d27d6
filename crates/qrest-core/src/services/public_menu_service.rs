//! Unauthenticated menu access for customers and preview links

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use qrest_security::JwtService;

use crate::domain::{
    actions, ActivityLog, CategoryWithItems, Menu, MenuView, OrganizationSummary, ThemeSetting,
    ViewType, VisitorInfo,
};
use crate::error::DomainError;
use crate::repositories::{
    ActivityLogRepository, MenuRepository, MenuViewRepository, OrganizationRepository,
    QrCodeRepository, ThemeRepository,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuBody {
    #[serde(flatten)]
    pub menu: Menu,
    pub organization: OrganizationSummary,
    pub categories: Vec<CategoryWithItems>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicMenu {
    pub menu: PublicMenuBody,
    pub theme: Option<ThemeSetting>,
}

pub struct PublicMenuService {
    menus: Arc<dyn MenuRepository>,
    qr_codes: Arc<dyn QrCodeRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    themes: Arc<dyn ThemeRepository>,
    views: Arc<dyn MenuViewRepository>,
    activity: Arc<dyn ActivityLogRepository>,
    jwt: Arc<JwtService>,
}

impl PublicMenuService {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        qr_codes: Arc<dyn QrCodeRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        themes: Arc<dyn ThemeRepository>,
        views: Arc<dyn MenuViewRepository>,
        activity: Arc<dyn ActivityLogRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            menus,
            qr_codes,
            organizations,
            themes,
            views,
            activity,
            jwt,
        }
    }

    /// Active menu behind a short id, showing available items only.
    pub async fn by_short_id(&self, short_id: &str) -> Result<PublicMenu, DomainError> {
        let menu = self.menu_for_short_id(short_id).await?;
        if !menu.is_active {
            return Err(DomainError::NotFound("Menu"));
        }
        self.assemble(menu, true).await
    }

    /// Best effort; failures are logged and never surface to the caller.
    pub async fn track_scan(&self, short_id: &str, visitor: VisitorInfo) {
        if let Err(e) = self.record_scan(short_id, visitor).await {
            warn!("Scan tracking failed for {}: {}", short_id, e);
        }
    }

    /// Editor preview through a signed link; inactive menus are allowed.
    pub async fn preview(
        &self,
        menu_id: &Uuid,
        token: &str,
        visitor: VisitorInfo,
    ) -> Result<PublicMenu, DomainError> {
        let claims = self
            .jwt
            .verify_preview_token(token)
            .map_err(|_| DomainError::Unauthenticated("Invalid or expired preview token".into()))?;
        if &claims.menu_id != menu_id {
            return Err(DomainError::Forbidden(
                "Preview token does not match this menu".into(),
            ));
        }

        let menu = self
            .menus
            .find_by_id(menu_id)
            .await?
            .ok_or(DomainError::NotFound("Menu"))?;

        if let Err(e) = self
            .views
            .record(&MenuView::new(menu.id, ViewType::Preview, visitor))
            .await
        {
            warn!("Preview view not recorded for menu {}: {}", menu.id, e);
        }

        self.assemble(menu, false).await
    }

    async fn record_scan(&self, short_id: &str, visitor: VisitorInfo) -> Result<(), DomainError> {
        let menu = self.menu_for_short_id(short_id).await?;

        self.activity
            .create(&ActivityLog::new(
                menu.org_id,
                None,
                actions::QR_SCAN,
                Some(json!({
                    "shortId": short_id,
                    "menuName": menu.name,
                    "timestamp": Utc::now().to_rfc3339(),
                    "userAgent": visitor.user_agent,
                })),
            ))
            .await?;
        self.views
            .record(&MenuView::new(menu.id, ViewType::QrScan, visitor))
            .await?;

        debug!("Scan tracked for menu {}", menu.id);
        Ok(())
    }

    async fn menu_for_short_id(&self, short_id: &str) -> Result<Menu, DomainError> {
        let qr = self
            .qr_codes
            .find_by_short_id(short_id)
            .await?
            .ok_or(DomainError::NotFound("Menu"))?;
        self.menus
            .find_by_id(&qr.menu_id)
            .await?
            .ok_or(DomainError::NotFound("Menu"))
    }

    async fn assemble(&self, menu: Menu, available_only: bool) -> Result<PublicMenu, DomainError> {
        let organization = self
            .organizations
            .find_by_id(&menu.org_id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))?;
        let categories = self.menus.load_categories(&menu.id, available_only).await?;
        let theme = self.themes.find_by_org(&menu.org_id).await?;

        Ok(PublicMenu {
            menu: PublicMenuBody {
                menu,
                organization: organization.summary(),
                categories,
            },
            theme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Organization, QrCode};
    use crate::repositories::{
        MockActivityLogRepository, MockMenuRepository, MockMenuViewRepository,
        MockOrganizationRepository, MockQrCodeRepository, MockThemeRepository,
    };
    use qrest_shared::config::JwtSettings;

    struct Mocks {
        menus: MockMenuRepository,
        qr_codes: MockQrCodeRepository,
        organizations: MockOrganizationRepository,
        themes: MockThemeRepository,
        views: MockMenuViewRepository,
        activity: MockActivityLogRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                menus: MockMenuRepository::new(),
                qr_codes: MockQrCodeRepository::new(),
                organizations: MockOrganizationRepository::new(),
                themes: MockThemeRepository::new(),
                views: MockMenuViewRepository::new(),
                activity: MockActivityLogRepository::new(),
            }
        }

        fn build(self) -> PublicMenuService {
            PublicMenuService::new(
                Arc::new(self.menus),
                Arc::new(self.qr_codes),
                Arc::new(self.organizations),
                Arc::new(self.themes),
                Arc::new(self.views),
                Arc::new(self.activity),
                Arc::new(JwtService::new(&JwtSettings {
                    access_secret: "a".repeat(32),
                    refresh_secret: "r".repeat(32),
                    access_token_expiry: 900,
                    refresh_token_expiry: 604800,
                    preview_token_expiry: 86400,
                })),
            )
        }
    }

    fn with_menu(mocks: &mut Mocks, menu: Menu) {
        let menu_id = menu.id;
        mocks.qr_codes.expect_find_by_short_id()
            .returning(move |short_id| Ok(Some(QrCode::new(menu_id, short_id.to_string(), json!({})))));
        mocks.menus.expect_find_by_id().returning(move |_| Ok(Some(menu.clone())));
    }

    #[tokio::test]
    async fn test_unknown_short_id_not_found() {
        let mut mocks = Mocks::new();
        mocks.qr_codes.expect_find_by_short_id().returning(|_| Ok(None));
        let err = mocks.build().by_short_id("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Menu not found");
    }

    #[tokio::test]
    async fn test_inactive_menu_not_found() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let mut menu = Menu::new(org.id, "Lunch", None).unwrap();
        menu.is_active = false;
        let mut mocks = Mocks::new();
        with_menu(&mut mocks, menu);

        let err = mocks.build().by_short_id("abcd1234").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_public_menu_loads_available_items_only() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let menu = Menu::new(org.id, "Lunch", None).unwrap();
        let mut mocks = Mocks::new();
        with_menu(&mut mocks, menu);
        mocks.organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        mocks.menus.expect_load_categories()
            .withf(|_, available_only| *available_only)
            .returning(|_, _| Ok(vec![]));
        mocks.themes.expect_find_by_org().returning(|_| Ok(None));

        let public = mocks.build().by_short_id("abcd1234").await.unwrap();
        assert_eq!(public.menu.organization.slug, "cafe");
        assert_eq!(public.menu.menu.name, "Lunch");
    }

    #[tokio::test]
    async fn test_track_scan_swallows_errors() {
        let mut mocks = Mocks::new();
        mocks.qr_codes.expect_find_by_short_id()
            .returning(|_| Err(DomainError::DatabaseError("down".into())));
        mocks.build().track_scan("abcd1234", VisitorInfo::default()).await;
    }

    #[tokio::test]
    async fn test_track_scan_logs_and_records_view() {
        let menu = Menu::new(Uuid::new_v4(), "Lunch", None).unwrap();
        let mut mocks = Mocks::new();
        with_menu(&mut mocks, menu);
        mocks.activity.expect_create()
            .withf(|log| log.action == "QR_SCAN" && log.user_id.is_none())
            .times(1)
            .returning(|_| Ok(()));
        mocks.views.expect_record()
            .withf(|view| view.view_type == ViewType::QrScan)
            .times(1)
            .returning(|_| Ok(()));

        mocks
            .build()
            .track_scan(
                "abcd1234",
                VisitorInfo {
                    user_agent: Some("test-agent".into()),
                    ..Default::default()
                },
            )
            .await;
    }

    #[tokio::test]
    async fn test_preview_rejects_token_for_other_menu() {
        let mocks = Mocks::new();
        let service = mocks.build();
        let token = service
            .jwt
            .generate_preview_token(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();
        let err = service
            .preview(&Uuid::new_v4(), &token, VisitorInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_preview_rejects_garbage_token() {
        let err = Mocks::new()
            .build()
            .preview(&Uuid::new_v4(), "garbage", VisitorInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }
}
