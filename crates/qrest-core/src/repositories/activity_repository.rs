//! Activity log repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use qrest_shared::Pagination;

use crate::domain::{ActivityLog, ActivityLogEntry, DailyCount, NamedCount};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn create(&self, log: &ActivityLog) -> Result<(), DomainError>;
    /// Newest first, optionally filtered by action.
    async fn list(
        &self,
        org_id: &Uuid,
        action: Option<String>,
        page: Pagination,
    ) -> Result<(Vec<ActivityLogEntry>, i64), DomainError>;
    async fn action_counts(&self, org_id: &Uuid) -> Result<Vec<NamedCount>, DomainError>;
    async fn count(
        &self,
        org_id: &Uuid,
        action: Option<String>,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, DomainError>;
    /// Most scanned menus, grouped by the `menuName` recorded on scan entries.
    async fn top_scanned_menus(&self, org_id: &Uuid, limit: i64) -> Result<Vec<NamedCount>, DomainError>;
    async fn daily_counts(
        &self,
        org_id: &Uuid,
        action: String,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, DomainError>;
}
