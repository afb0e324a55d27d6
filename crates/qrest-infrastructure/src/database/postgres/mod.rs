//! PostgreSQL repository implementations

pub mod user_repo_impl;
pub mod organization_repo_impl;
pub mod menu_repo_impl;
pub mod qr_code_repo_impl;
pub mod billing_repo_impl;
pub mod activity_repo_impl;
pub mod auth_token_repo_impl;

pub use user_repo_impl::PgUserRepository;
pub use organization_repo_impl::{PgMembershipRepository, PgOrganizationRepository};
pub use menu_repo_impl::{
    PgCategoryRepository, PgMenuItemRepository, PgMenuRepository, PgMenuViewRepository,
};
pub use qr_code_repo_impl::{PgQrCodeRepository, PgThemeRepository};
pub use billing_repo_impl::{
    PgAiContentRepository, PgCreditPackageRepository, PgCreditRepository,
    PgSubscriptionPlanRepository,
};
pub use activity_repo_impl::PgActivityLogRepository;
pub use auth_token_repo_impl::PgAuthTokenRepository;
