//! Organization dashboard handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::ActivityLogEntry;
use qrest_core::services::DashboardStats;

use crate::error::ApiResult;
use crate::extractors::{ApiPath, ApiQuery, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

fn default_recent_limit() -> i64 {
    10
}

/// GET /api/dashboard/{org_id}/stats
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<DashboardStats>> {
    let stats = state.activity.dashboard(&user.user_id, &org_id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/dashboard/{org_id}/recent-activity
pub async fn recent_activity(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> ApiResult<ApiResponse<Vec<ActivityLogEntry>>> {
    let entries = state
        .activity
        .recent(&user.user_id, &org_id, query.limit.clamp(1, 100))
        .await?;
    Ok(ApiResponse::success(entries))
}
