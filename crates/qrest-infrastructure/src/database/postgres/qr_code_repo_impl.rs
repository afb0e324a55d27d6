// ============================================================================
// QRest Infrastructure - PostgreSQL QR Code & Theme Repositories
// File: crates/qrest-infrastructure/src/database/postgres/qr_code_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use qrest_core::domain::{QrCode, ThemeSetting};
use qrest_core::error::DomainError;
use qrest_core::repositories::{QrCodeRepository, ThemeRepository};

use crate::database::error::map_db_error;

const QR_COLUMNS: &str = "id, menu_id, short_id, style_json, created_at, updated_at";
const THEME_COLUMNS: &str =
    r#"id, org_id, theme_key, "primary", accent, custom_css, created_at, updated_at"#;

#[derive(Debug, FromRow)]
struct QrCodeRow {
    id: Uuid,
    menu_id: Uuid,
    short_id: String,
    style_json: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QrCodeRow> for QrCode {
    fn from(row: QrCodeRow) -> Self {
        QrCode {
            id: row.id,
            menu_id: row.menu_id,
            short_id: row.short_id,
            style_json: row.style_json,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgQrCodeRepository {
    pool: PgPool,
}

impl PgQrCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QrCodeRepository for PgQrCodeRepository {
    async fn find_by_menu(&self, menu_id: &Uuid) -> Result<Option<QrCode>, DomainError> {
        let row: Option<QrCodeRow> =
            sqlx::query_as(&format!("SELECT {} FROM qr_codes WHERE menu_id = $1", QR_COLUMNS))
                .bind(menu_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding QR code by menu", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<QrCode>, DomainError> {
        let row: Option<QrCodeRow> =
            sqlx::query_as(&format!("SELECT {} FROM qr_codes WHERE short_id = $1", QR_COLUMNS))
                .bind(short_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding QR code by short id", e))?;

        Ok(row.map(Into::into))
    }

    async fn short_id_exists(&self, short_id: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM qr_codes WHERE short_id = $1)")
            .bind(short_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("checking short id", e))
    }

    async fn create(&self, qr: &QrCode) -> Result<QrCode, DomainError> {
        let row: QrCodeRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO qr_codes ({cols})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {cols}
            "#,
            cols = QR_COLUMNS
        ))
        .bind(qr.id)
        .bind(qr.menu_id)
        .bind(&qr.short_id)
        .bind(&qr.style_json)
        .bind(qr.created_at)
        .bind(qr.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating QR code", e))?;

        Ok(row.into())
    }

    async fn update_style(&self, menu_id: &Uuid, style: Value) -> Result<Option<QrCode>, DomainError> {
        let row: Option<QrCodeRow> = sqlx::query_as(&format!(
            "UPDATE qr_codes SET style_json = $2, updated_at = NOW() WHERE menu_id = $1 RETURNING {}",
            QR_COLUMNS
        ))
        .bind(menu_id)
        .bind(&style)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating QR style", e))?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, FromRow)]
struct ThemeRow {
    id: Uuid,
    org_id: Uuid,
    theme_key: String,
    primary: Option<String>,
    accent: Option<String>,
    custom_css: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ThemeRow> for ThemeSetting {
    fn from(row: ThemeRow) -> Self {
        ThemeSetting {
            id: row.id,
            org_id: row.org_id,
            theme_key: row.theme_key,
            primary: row.primary,
            accent: row.accent,
            custom_css: row.custom_css,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgThemeRepository {
    pool: PgPool,
}

impl PgThemeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThemeRepository for PgThemeRepository {
    async fn find_by_org(&self, org_id: &Uuid) -> Result<Option<ThemeSetting>, DomainError> {
        let row: Option<ThemeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM theme_settings WHERE org_id = $1",
            THEME_COLUMNS
        ))
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding theme", e))?;

        Ok(row.map(Into::into))
    }

    async fn upsert(&self, theme: &ThemeSetting) -> Result<ThemeSetting, DomainError> {
        let row: ThemeRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO theme_settings ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (org_id) DO UPDATE
            SET theme_key = EXCLUDED.theme_key,
                "primary" = EXCLUDED."primary",
                accent = EXCLUDED.accent,
                custom_css = EXCLUDED.custom_css,
                updated_at = EXCLUDED.updated_at
            RETURNING {cols}
            "#,
            cols = THEME_COLUMNS
        ))
        .bind(theme.id)
        .bind(theme.org_id)
        .bind(&theme.theme_key)
        .bind(&theme.primary)
        .bind(&theme.accent)
        .bind(&theme.custom_css)
        .bind(theme.created_at)
        .bind(theme.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("saving theme", e))?;

        Ok(row.into())
    }
}
