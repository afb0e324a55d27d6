//! # QRest Core - Domain Module
//!
//! Domain entities for the menu platform.

pub mod user;
pub mod organization;
pub mod membership;
pub mod menu;
pub mod qr_code;
pub mod theme;
pub mod billing;
pub mod ai_content;
pub mod activity;
pub mod auth_token;

// Re-export all entities and enums
pub use user::{User, UserSummary};
pub use organization::{
    first_day_of_next_month, OrgStatus, Organization, OrganizationCounts, OrganizationSummary, Plan,
};
pub use membership::{MemberWithUser, Membership, MembershipWithOrg, Role};
pub use menu::{
    Category, CategoryWithCount, CategoryWithItems, Menu, MenuItem, MenuSummary, MenuTree,
    NewMenuItem,
};
pub use qr_code::{QrCode, QrFormat, QrStyle};
pub use theme::{ThemeSetting, ThemeUpdate};
pub use billing::{
    credit_cost, CreditFeature, CreditPackage, CreditTransaction, SubscriptionPlan,
    TransactionType,
};
pub use ai_content::{AiGeneratedContent, ContentType};
pub use activity::{
    actions, ActivityLog, ActivityLogEntry, DailyCount, MenuView, NamedCount, ViewType,
    VisitorInfo,
};
pub use auth_token::{PasswordResetToken, RefreshToken, VerificationToken};
