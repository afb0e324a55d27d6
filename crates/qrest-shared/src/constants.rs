//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";
pub const TOKEN_TYPE_PREVIEW: &str = "preview";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 900;
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 604800;
pub const DEFAULT_PREVIEW_TOKEN_EXPIRY: i64 = 86400;
pub const MIN_JWT_SECRET_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_RESET_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
pub const PASSWORD_RESET_TOKEN_TTL_HOURS: i64 = 1;

pub const SIGNUP_AI_CREDITS: i32 = 50;
pub const TOKENS_PER_CREDIT: i64 = 1000;
pub const CREDIT_RESET_INTERVAL_DAYS: i64 = 30;
pub const UNLIMITED: i32 = -1;

pub const SHORT_ID_LENGTH: usize = 8;
pub const SHORT_ID_MAX_ATTEMPTS: usize = 5;
pub const QR_PREVIEW_WIDTH: u32 = 300;
pub const QR_DOWNLOAD_WIDTH: u32 = 512;

pub const DEFAULT_MENU_LOCALE: &str = "tr";
pub const DEFAULT_THEME_KEY: &str = "default";
pub const RECENT_WINDOW_DAYS: i64 = 7;
