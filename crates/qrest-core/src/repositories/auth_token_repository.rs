//! Refresh, verification and password reset token repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PasswordResetToken, RefreshToken, VerificationToken};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), DomainError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;
    async fn revoke_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError>;
    async fn revoke_all_for_user(&self, user_id: &Uuid) -> Result<u64, DomainError>;

    async fn create_verification_token(&self, token: &VerificationToken) -> Result<(), DomainError>;
    async fn find_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, DomainError>;
    async fn delete_verification_token(&self, token_hash: &str) -> Result<(), DomainError>;
    async fn delete_verification_tokens_for(&self, identifier: &str) -> Result<(), DomainError>;

    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> Result<(), DomainError>;
    async fn find_password_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, DomainError>;
    async fn delete_password_reset_token(&self, token_hash: &str) -> Result<(), DomainError>;
    async fn delete_password_reset_tokens_for(&self, user_id: &Uuid) -> Result<(), DomainError>;
}
