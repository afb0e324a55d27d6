//! QR code and theme repository traits (ports)

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{QrCode, ThemeSetting};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QrCodeRepository: Send + Sync {
    async fn find_by_menu(&self, menu_id: &Uuid) -> Result<Option<QrCode>, DomainError>;
    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<QrCode>, DomainError>;
    async fn short_id_exists(&self, short_id: &str) -> Result<bool, DomainError>;
    async fn create(&self, qr: &QrCode) -> Result<QrCode, DomainError>;
    async fn update_style(&self, menu_id: &Uuid, style: Value) -> Result<Option<QrCode>, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThemeRepository: Send + Sync {
    async fn find_by_org(&self, org_id: &Uuid) -> Result<Option<ThemeSetting>, DomainError>;
    /// Insert or replace the organization's theme.
    async fn upsert(&self, theme: &ThemeSetting) -> Result<ThemeSetting, DomainError>;
}
