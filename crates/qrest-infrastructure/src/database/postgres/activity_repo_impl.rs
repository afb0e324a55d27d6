// ============================================================================
// QRest Infrastructure - PostgreSQL Activity Log Repository
// File: crates/qrest-infrastructure/src/database/postgres/activity_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use qrest_core::domain::{ActivityLog, ActivityLogEntry, DailyCount, NamedCount, UserSummary};
use qrest_core::error::DomainError;
use qrest_core::repositories::ActivityLogRepository;
use qrest_shared::Pagination;

use crate::database::error::map_db_error;

#[derive(Debug, FromRow)]
struct ActivityEntryRow {
    id: Uuid,
    org_id: Uuid,
    user_id: Option<Uuid>,
    action: String,
    details: Option<Value>,
    created_at: DateTime<Utc>,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<ActivityEntryRow> for ActivityLogEntry {
    fn from(row: ActivityEntryRow) -> Self {
        let user = match (row.user_id, row.user_email) {
            (Some(id), Some(email)) => Some(UserSummary {
                id,
                name: row.user_name,
                email,
            }),
            _ => None,
        };
        ActivityLogEntry {
            log: ActivityLog {
                id: row.id,
                org_id: row.org_id,
                user_id: row.user_id,
                action: row.action,
                details: row.details,
                created_at: row.created_at,
            },
            user,
        }
    }
}

pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn create(&self, log: &ActivityLog) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, org_id, user_id, action, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(log.id)
        .bind(log.org_id)
        .bind(log.user_id)
        .bind(&log.action)
        .bind(&log.details)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("writing activity log", e))?;
        Ok(())
    }

    async fn list(
        &self,
        org_id: &Uuid,
        action: Option<String>,
        page: Pagination,
    ) -> Result<(Vec<ActivityLogEntry>, i64), DomainError> {
        let rows: Vec<ActivityEntryRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.org_id, a.user_id, a.action, a.details, a.created_at,
                   u.name AS user_name, u.email AS user_email
            FROM activity_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.org_id = $1 AND ($2::TEXT IS NULL OR a.action = $2)
            ORDER BY a.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(org_id)
        .bind(&action)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing activity", e))?;

        let total = self.count(org_id, action, None).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn action_counts(&self, org_id: &Uuid) -> Result<Vec<NamedCount>, DomainError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT action, COUNT(*) FROM activity_logs
            WHERE org_id = $1
            GROUP BY action
            ORDER BY COUNT(*) DESC, action
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("grouping activity by action", e))?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| NamedCount { name, count })
            .collect())
    }

    async fn count(
        &self,
        org_id: &Uuid,
        action: Option<String>,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_logs
            WHERE org_id = $1
              AND ($2::TEXT IS NULL OR action = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
            "#,
        )
        .bind(org_id)
        .bind(action)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting activity", e))
    }

    async fn top_scanned_menus(&self, org_id: &Uuid, limit: i64) -> Result<Vec<NamedCount>, DomainError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT details->>'menuName' AS menu_name, COUNT(*) AS scans
            FROM activity_logs
            WHERE org_id = $1 AND action = 'QR_SCAN' AND details->>'menuName' IS NOT NULL
            GROUP BY 1
            ORDER BY 2 DESC, 1
            LIMIT $2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("ranking scanned menus", e))?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| NamedCount { name, count })
            .collect())
    }

    async fn daily_counts(
        &self,
        org_id: &Uuid,
        action: String,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, DomainError> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE, COUNT(*)
            FROM activity_logs
            WHERE org_id = $1 AND action = $2 AND created_at >= $3
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(org_id)
        .bind(&action)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("counting daily activity", e))?;

        Ok(rows
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }
}
