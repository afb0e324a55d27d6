// ============================================================================
// QRest Infrastructure - PostgreSQL Auth Token Repository
// File: crates/qrest-infrastructure/src/database/postgres/auth_token_repo_impl.rs
// Description: Refresh, email verification and password reset token digests
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use qrest_core::domain::{PasswordResetToken, RefreshToken, VerificationToken};
use qrest_core::error::DomainError;
use qrest_core::repositories::AuthTokenRepository;

use crate::database::error::map_db_error;

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    token_hash: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshToken {
            id: row.id,
            token_hash: row.token_hash,
            user_id: row.user_id,
            expires_at: row.expires_at,
            revoked: row.revoked,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct VerificationTokenRow {
    identifier: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

impl From<VerificationTokenRow> for VerificationToken {
    fn from(row: VerificationTokenRow) -> Self {
        VerificationToken {
            identifier: row.identifier,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PasswordResetTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<PasswordResetTokenRow> for PasswordResetToken {
    fn from(row: PasswordResetTokenRow) -> Self {
        PasswordResetToken {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

pub struct PgAuthTokenRepository {
    pool: PgPool,
}

impl PgAuthTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthTokenRepository for PgAuthTokenRepository {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("storing refresh token", e))?;
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            "SELECT id, token_hash, user_id, expires_at, revoked, created_at FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding refresh token", e))?;

        Ok(row.map(Into::into))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE token_hash = $1 AND NOT revoked",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("revoking refresh token", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: &Uuid) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("revoking user sessions", e))?;

        info!("Revoked {} sessions for user {}", result.rows_affected(), user_id);
        Ok(result.rows_affected())
    }

    async fn create_verification_token(&self, token: &VerificationToken) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO verification_tokens (identifier, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token.identifier)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("storing verification token", e))?;
        Ok(())
    }

    async fn find_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, DomainError> {
        let row: Option<VerificationTokenRow> = sqlx::query_as(
            "SELECT identifier, token_hash, expires_at FROM verification_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding verification token", e))?;

        Ok(row.map(Into::into))
    }

    async fn delete_verification_token(&self, token_hash: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM verification_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting verification token", e))?;
        Ok(())
    }

    async fn delete_verification_tokens_for(&self, identifier: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM verification_tokens WHERE identifier = $1")
            .bind(identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("clearing verification tokens", e))?;
        Ok(())
    }

    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("storing password reset token", e))?;
        Ok(())
    }

    async fn find_password_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, DomainError> {
        let row: Option<PasswordResetTokenRow> = sqlx::query_as(
            "SELECT id, user_id, token_hash, expires_at, created_at FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding password reset token", e))?;

        Ok(row.map(Into::into))
    }

    async fn delete_password_reset_token(&self, token_hash: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting password reset token", e))?;
        Ok(())
    }

    async fn delete_password_reset_tokens_for(&self, user_id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("clearing password reset tokens", e))?;
        Ok(())
    }
}
