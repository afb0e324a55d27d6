//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod error;
pub mod postgres;

pub use connection::{create_pool, run_migrations};
pub use error::map_db_error;
pub use postgres::{
    PgActivityLogRepository, PgAiContentRepository, PgAuthTokenRepository, PgCategoryRepository,
    PgCreditPackageRepository, PgCreditRepository, PgMembershipRepository, PgMenuItemRepository,
    PgMenuRepository, PgMenuViewRepository, PgOrganizationRepository, PgQrCodeRepository,
    PgSubscriptionPlanRepository, PgThemeRepository, PgUserRepository,
};
