use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;

use qrest_core::services::{
    AccountService, ActivityService, AdminService, AiService, AuthService, CatalogService,
    CategoryService, CreditService, MenuItemService, MenuService, OrganizationService,
    PublicMenuService, QrCodeService, TeamService, ThemeService,
};
use qrest_security::JwtService;
use qrest_shared::config::AppConfig;

use crate::middleware::RateLimiter;

/// Process facts reported by the health endpoint.
#[derive(Clone)]
pub struct ServerInfo {
    pub environment: String,
    pub version: &'static str,
    pub started_at: Instant,
}

impl ServerInfo {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            version: env!("CARGO_PKG_VERSION"),
            started_at: Instant::now(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub server: ServerInfo,
    pub jwt: Arc<JwtService>,
    pub rate_limiter: RateLimiter,
    pub auth: Arc<AuthService>,
    pub account: Arc<AccountService>,
    pub organizations: Arc<OrganizationService>,
    pub team: Arc<TeamService>,
    pub menus: Arc<MenuService>,
    pub categories: Arc<CategoryService>,
    pub items: Arc<MenuItemService>,
    pub qr_codes: Arc<QrCodeService>,
    pub public_menus: Arc<PublicMenuService>,
    pub themes: Arc<ThemeService>,
    pub activity: Arc<ActivityService>,
    pub credits: Arc<CreditService>,
    pub ai: Arc<AiService>,
    pub admin: Arc<AdminService>,
    pub catalog: Arc<CatalogService>,
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl FromRef<AppState> for ServerInfo {
    fn from_ref(state: &AppState) -> Self {
        state.server.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}
