//! Unauthenticated menu access

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::services::PublicMenu;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiPath, ApiQuery, Visitor};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub token: Option<String>,
}

/// GET /api/public/menu/{short_id}
pub async fn menu(
    State(state): State<AppState>,
    ApiPath(short_id): ApiPath<String>,
) -> ApiResult<ApiResponse<PublicMenu>> {
    let menu = state.public_menus.by_short_id(&short_id).await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/public/menu/{short_id}/scan
///
/// Always succeeds; tracking failures are only logged.
pub async fn track_scan(
    State(state): State<AppState>,
    ApiPath(short_id): ApiPath<String>,
    Visitor(visitor): Visitor,
) -> ApiResponse<()> {
    state.public_menus.track_scan(&short_id, visitor).await;
    ApiResponse::message("Scan tracked")
}

/// GET /api/public/menu/preview/{menu_id}?token=
pub async fn preview(
    State(state): State<AppState>,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PreviewQuery>,
    Visitor(visitor): Visitor,
) -> ApiResult<ApiResponse<PublicMenu>> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Preview token is required".into()))?;
    let menu = state.public_menus.preview(&menu_id, &token, visitor).await?;
    Ok(ApiResponse::success(menu))
}
