//! Repository traits (ports)

pub mod user_repository;
pub mod organization_repository;
pub mod menu_repository;
pub mod qr_code_repository;
pub mod billing_repository;
pub mod activity_repository;
pub mod auth_token_repository;

pub use user_repository::UserRepository;
pub use organization_repository::{MembershipRepository, OrganizationFilter, OrganizationRepository};
pub use menu_repository::{
    CategoryRepository, MenuFilter, MenuItemRepository, MenuRepository, MenuViewRepository,
};
pub use qr_code_repository::{QrCodeRepository, ThemeRepository};
pub use billing_repository::{
    AiContentRepository, CreditPackageRepository, CreditRepository, PlanFilter,
    SubscriptionPlanRepository, TransactionFilter,
};
pub use activity_repository::ActivityLogRepository;
pub use auth_token_repository::AuthTokenRepository;

#[cfg(test)]
pub use user_repository::MockUserRepository;
#[cfg(test)]
pub use organization_repository::{MockMembershipRepository, MockOrganizationRepository};
#[cfg(test)]
pub use menu_repository::{
    MockCategoryRepository, MockMenuItemRepository, MockMenuRepository, MockMenuViewRepository,
};
#[cfg(test)]
pub use qr_code_repository::{MockQrCodeRepository, MockThemeRepository};
#[cfg(test)]
pub use billing_repository::{
    MockAiContentRepository, MockCreditPackageRepository, MockCreditRepository,
    MockSubscriptionPlanRepository,
};
#[cfg(test)]
pub use activity_repository::MockActivityLogRepository;
#[cfg(test)]
pub use auth_token_repository::MockAuthTokenRepository;
