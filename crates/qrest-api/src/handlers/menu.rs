//! Menu handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::{Menu, MenuSummary, MenuTree};
use qrest_core::services::{CreateMenu, MenuAnalytics, PreviewToken, UpdateMenu};
use qrest_shared::Pagination;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{ApiResponse, Created, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MenuListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

/// GET /api/menus
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<MenuListQuery>,
) -> ApiResult<PaginatedResponse<MenuSummary>> {
    let page = state
        .menus
        .list(
            &user.actor()?,
            query.search.filter(|s| !s.trim().is_empty()),
            Pagination::new(query.page, query.limit),
        )
        .await?;
    Ok(page.into())
}

/// GET /api/menus/{menu_id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<MenuTree>> {
    let menu = state.menus.get(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateMenu>,
) -> ApiResult<Created<Menu>> {
    let menu = state.menus.create(&user.actor()?, payload).await?;
    Ok(Created(menu))
}

/// PUT /api/menus/{menu_id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMenu>,
) -> ApiResult<ApiResponse<Menu>> {
    let menu = state.menus.update(&user.actor()?, &menu_id, payload).await?;
    Ok(ApiResponse::success_with_message(menu, "Menu updated"))
}

/// DELETE /api/menus/{menu_id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.menus.delete(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::message("Menu deleted"))
}

/// POST /api/menus/{menu_id}/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<Created<Menu>> {
    let copy = state.menus.duplicate(&user.actor()?, &menu_id).await?;
    Ok(Created(copy))
}

/// POST /api/menus/{menu_id}/preview-token
pub async fn preview_token(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<PreviewToken>> {
    let token = state.menus.preview_token(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::success(token))
}

/// GET /api/menus/{menu_id}/analytics
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DaysQuery>,
) -> ApiResult<ApiResponse<MenuAnalytics>> {
    let analytics = state
        .menus
        .analytics(&user.actor()?, &menu_id, query.days)
        .await?;
    Ok(ApiResponse::success(analytics))
}
