//! Domain services (business logic)

pub mod context;
pub mod auth_service;
pub mod account_service;
pub mod organization_service;
pub mod team_service;
pub mod menu_service;
pub mod category_service;
pub mod menu_item_service;
pub mod qr_code_service;
pub mod public_menu_service;
pub mod theme_service;
pub mod activity_service;
pub mod credit_service;
pub mod ai_service;
pub mod admin_service;
pub mod catalog_service;

pub use context::Actor;
pub use auth_service::{
    AuthResult, AuthService, CurrentUser, OrganizationContext, RefreshResult, RegisterInput,
};
pub use account_service::{AccountService, ResetLink, ResetTokenStatus, VerificationLink};
pub use organization_service::{OrganizationDetails, OrganizationService, UpdateOrganization};
pub use team_service::TeamService;
pub use menu_service::{CreateMenu, MenuAnalytics, MenuService, PreviewToken, UpdateMenu};
pub use category_service::{CategoryService, CreateCategory, UpdateCategory};
pub use menu_item_service::{CreateMenuItem, MenuItemService, UpdateMenuItem};
pub use qr_code_service::{QrCodeService, QrDownload, QrPreview};
pub use public_menu_service::{PublicMenu, PublicMenuBody, PublicMenuService};
pub use theme_service::{ThemeService, UpdateTheme};
pub use activity_service::{ActivityService, ActivityStats, DashboardStats};
pub use credit_service::{
    CreditBalance, CreditService, PurchaseResult, TransactionPage, ContentPage, UsageStats,
};
pub use ai_service::{
    AiGeneration, AiService, AnalyzeMenu, GenerateDescription, GenerateImagePrompt, GenerateMenu,
    OptimizeDescription, TranslateItem,
};
pub use admin_service::{
    AdminMenuStats, AdminOrganization, AdminService, AdminUpdateOrganization, AdminUpdateUser,
    AdminUser, PlatformStats,
};
pub use catalog_service::{CatalogService, CreatePackage, CreatePlan, UpdatePackage, UpdatePlan};
