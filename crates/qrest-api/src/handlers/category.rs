//! Category handlers, nested under a menu and standalone by id

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::{Category, CategoryWithCount, CategoryWithItems, MenuItem};
use qrest_core::services::{CreateCategory, CreateMenuItem, UpdateCategory};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategories {
    pub category_ids: Vec<Uuid>,
}

/// GET /api/menus/{menu_id}/categories
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<CategoryWithCount>>> {
    let categories = state.categories.list(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::success(categories))
}

/// POST /api/menus/{menu_id}/categories
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateCategory>,
) -> ApiResult<Created<Category>> {
    let category = state
        .categories
        .create(&user.actor()?, &menu_id, payload)
        .await?;
    Ok(Created(category))
}

/// PUT /api/menus/{menu_id}/categories/reorder
pub async fn reorder(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ReorderCategories>,
) -> ApiResult<ApiResponse<()>> {
    state
        .categories
        .reorder(&user.actor()?, &menu_id, payload.category_ids)
        .await?;
    Ok(ApiResponse::message("Categories reordered"))
}

/// GET /api/menus/{menu_id}/categories/{category_id}
pub async fn get_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<CategoryWithItems>> {
    let category = state
        .categories
        .get(&user.actor()?, &category_id, Some(menu_id))
        .await?;
    Ok(ApiResponse::success(category))
}

/// PUT /api/menus/{menu_id}/categories/{category_id}
pub async fn update_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateCategory>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .categories
        .update(&user.actor()?, &category_id, Some(menu_id), payload)
        .await?;
    Ok(ApiResponse::success_with_message(category, "Category updated"))
}

/// DELETE /api/menus/{menu_id}/categories/{category_id}
pub async fn delete_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<()>> {
    state
        .categories
        .delete(&user.actor()?, &category_id, Some(menu_id))
        .await?;
    Ok(ApiResponse::message("Category deleted"))
}

/// GET /api/categories/{category_id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(category_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CategoryWithItems>> {
    let category = state.categories.get(&user.actor()?, &category_id, None).await?;
    Ok(ApiResponse::success(category))
}

/// PUT /api/categories/{category_id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(category_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCategory>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .categories
        .update(&user.actor()?, &category_id, None, payload)
        .await?;
    Ok(ApiResponse::success_with_message(category, "Category updated"))
}

/// DELETE /api/categories/{category_id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(category_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state
        .categories
        .delete(&user.actor()?, &category_id, None)
        .await?;
    Ok(ApiResponse::message("Category deleted"))
}

/// POST /api/categories/{category_id}/items
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(category_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateMenuItem>,
) -> ApiResult<Created<MenuItem>> {
    let item = state
        .items
        .create(&user.actor()?, &category_id, None, payload)
        .await?;
    Ok(Created(item))
}
