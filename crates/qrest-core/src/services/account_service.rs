//! Email verification and password reset flows

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use qrest_security::password::PasswordService;
use qrest_security::token::{generate_secret_token, hash_token};
use qrest_shared::constants::{
    MAX_PASSWORD_LENGTH, MIN_RESET_PASSWORD_LENGTH, PASSWORD_RESET_TOKEN_TTL_HOURS,
    VERIFICATION_TOKEN_TTL_HOURS,
};
use qrest_shared::utils::{mask_email, normalize_email};

use crate::domain::{PasswordResetToken, VerificationToken};
use crate::error::DomainError;
use crate::repositories::{AuthTokenRepository, UserRepository};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationLink {
    pub verification_link: String,
    pub expires_in_hours: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetLink {
    /// Only present when the email belongs to an account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenStatus {
    pub valid: bool,
    pub email: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn AuthTokenRepository>,
    frontend_url: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn AuthTokenRepository>,
        frontend_url: String,
    ) -> Self {
        Self {
            users,
            tokens,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issue a fresh verification link, replacing any earlier one.
    pub async fn send_verification(&self, user_id: &Uuid) -> Result<VerificationLink, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("User"))?;

        if user.email_verified {
            return Err(DomainError::ValidationError("Email is already verified".into()));
        }

        self.tokens.delete_verification_tokens_for(&user.email).await?;

        let token = generate_secret_token();
        let record = VerificationToken::new(&user.email, hash_token(&token), VERIFICATION_TOKEN_TTL_HOURS);
        self.tokens.create_verification_token(&record).await?;

        info!("Verification link issued for {}", mask_email(&user.email));

        Ok(VerificationLink {
            verification_link: format!("{}/verify-email?token={}", self.frontend_url, token),
            expires_in_hours: VERIFICATION_TOKEN_TTL_HOURS,
        })
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), DomainError> {
        let token_hash = hash_token(token);
        let record = self
            .tokens
            .find_verification_token(&token_hash)
            .await?
            .ok_or_else(|| DomainError::ValidationError("Invalid verification token".into()))?;

        if record.is_expired() {
            self.tokens.delete_verification_token(&token_hash).await?;
            return Err(DomainError::ValidationError(
                "Verification token has expired".into(),
            ));
        }

        let mut user = self
            .users
            .find_by_email(&record.identifier)
            .await?
            .ok_or(DomainError::NotFound("User"))?;
        user.mark_verified();
        self.users.update(&user).await?;
        self.tokens.delete_verification_token(&token_hash).await?;

        info!("Email verified for {}", mask_email(&user.email));
        Ok(())
    }

    /// Always succeeds so callers cannot probe which emails exist.
    pub async fn forgot_password(&self, email: &str) -> Result<ResetLink, DomainError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Password reset requested for unknown email {}", mask_email(&email));
            return Ok(ResetLink { reset_link: None });
        };

        self.tokens.delete_password_reset_tokens_for(&user.id).await?;

        let token = generate_secret_token();
        let record = PasswordResetToken::new(user.id, hash_token(&token), PASSWORD_RESET_TOKEN_TTL_HOURS);
        self.tokens.create_password_reset_token(&record).await?;

        info!("Password reset link issued for {}", mask_email(&email));

        Ok(ResetLink {
            reset_link: Some(format!("{}/reset-password?token={}", self.frontend_url, token)),
        })
    }

    pub async fn verify_reset_token(&self, token: &str) -> Result<ResetTokenStatus, DomainError> {
        let record = self.live_reset_token(token).await?;
        let user = self
            .users
            .find_by_id(&record.user_id)
            .await?
            .ok_or_else(|| DomainError::ValidationError("Invalid or expired reset token".into()))?;
        Ok(ResetTokenStatus {
            valid: true,
            email: user.email,
        })
    }

    /// Set a new password and end every session of the user.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), DomainError> {
        let length = password.chars().count();
        if length < MIN_RESET_PASSWORD_LENGTH {
            return Err(DomainError::ValidationError(format!(
                "password: Password must be at least {} characters",
                MIN_RESET_PASSWORD_LENGTH
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(DomainError::ValidationError(format!(
                "password: Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        let record = self.live_reset_token(token).await?;
        let mut user = self
            .users
            .find_by_id(&record.user_id)
            .await?
            .ok_or_else(|| DomainError::ValidationError("Invalid or expired reset token".into()))?;

        let hash = PasswordService::hash(password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        user.set_password_hash(hash);
        self.users.update(&user).await?;

        self.tokens.delete_password_reset_token(&record.token_hash).await?;
        let revoked = self.tokens.revoke_all_for_user(&user.id).await?;

        info!(
            "Password reset for {} ({} sessions revoked)",
            mask_email(&user.email),
            revoked
        );
        Ok(())
    }

    async fn live_reset_token(&self, token: &str) -> Result<PasswordResetToken, DomainError> {
        let token_hash = hash_token(token);
        let record = self
            .tokens
            .find_password_reset_token(&token_hash)
            .await?
            .ok_or_else(|| DomainError::ValidationError("Invalid or expired reset token".into()))?;

        if record.is_expired() {
            self.tokens.delete_password_reset_token(&token_hash).await?;
            return Err(DomainError::ValidationError("Invalid or expired reset token".into()));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::repositories::{MockAuthTokenRepository, MockUserRepository};

    fn service(users: MockUserRepository, tokens: MockAuthTokenRepository) -> AccountService {
        AccountService::new(Arc::new(users), Arc::new(tokens), "http://localhost:3000/".into())
    }

    #[tokio::test]
    async fn test_send_verification_already_verified() {
        let mut user = User::new("a@demo.com", "hash".into(), None).unwrap();
        user.mark_verified();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));

        let err = service(users, MockAuthTokenRepository::new())
            .send_verification(&Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is already verified");
    }

    #[tokio::test]
    async fn test_send_verification_replaces_old_tokens() {
        let user = User::new("a@demo.com", "hash".into(), None).unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_delete_verification_tokens_for()
            .withf(|identifier| identifier == "a@demo.com")
            .times(1)
            .returning(|_| Ok(()));
        tokens.expect_create_verification_token().times(1).returning(|_| Ok(()));

        let link = service(users, tokens)
            .send_verification(&Uuid::new_v4())
            .await
            .unwrap();
        assert!(link
            .verification_link
            .starts_with("http://localhost:3000/verify-email?token="));
    }

    #[tokio::test]
    async fn test_verify_email_expired_token_is_deleted() {
        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_find_verification_token()
            .returning(|hash| Ok(Some(VerificationToken::new("a@demo.com", hash.to_string(), -1))));
        tokens.expect_delete_verification_token().times(1).returning(|_| Ok(()));

        let err = service(MockUserRepository::new(), tokens)
            .verify_email("abc")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Verification token has expired");
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_succeeds() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let result = service(users, MockAuthTokenRepository::new())
            .forgot_password("ghost@demo.com")
            .await
            .unwrap();
        assert!(result.reset_link.is_none());
    }

    #[tokio::test]
    async fn test_reset_password_revokes_sessions() {
        let user = User::new("a@demo.com", "old".into(), None).unwrap();
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users.expect_update()
            .withf(|u| u.password_hash.starts_with("$argon2"))
            .times(1)
            .returning(|u| Ok(u.clone()));
        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_find_password_reset_token()
            .returning(move |hash| Ok(Some(PasswordResetToken::new(user_id, hash.to_string(), 1))));
        tokens.expect_delete_password_reset_token().times(1).returning(|_| Ok(()));
        tokens.expect_revoke_all_for_user()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(2));

        service(users, tokens)
            .reset_password("token", "newpass")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_too_short() {
        let err = service(MockUserRepository::new(), MockAuthTokenRepository::new())
            .reset_password("token", "12345")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_reset_password_length_counts_characters() {
        // 3 characters, 6 bytes
        let err = service(MockUserRepository::new(), MockAuthTokenRepository::new())
            .reset_password("token", "şşş")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));

        let err = service(MockUserRepository::new(), MockAuthTokenRepository::new())
            .reset_password("token", &"ş".repeat(MAX_PASSWORD_LENGTH + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }
}
