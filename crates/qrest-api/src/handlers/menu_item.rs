//! Menu item handlers, nested under a category and standalone by id

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::MenuItem;
use qrest_core::services::{CreateMenuItem, UpdateMenuItem};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItems {
    pub item_ids: Vec<Uuid>,
}

/// GET /api/menus/{menu_id}/categories/{category_id}/items
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<Vec<MenuItem>>> {
    let items = state
        .items
        .list(&user.actor()?, &category_id, Some(menu_id))
        .await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/menus/{menu_id}/categories/{category_id}/items
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<CreateMenuItem>,
) -> ApiResult<Created<MenuItem>> {
    let item = state
        .items
        .create(&user.actor()?, &category_id, Some(menu_id), payload)
        .await?;
    Ok(Created(item))
}

/// PUT /api/menus/{menu_id}/categories/{category_id}/items/reorder
pub async fn reorder(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((menu_id, category_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<ReorderItems>,
) -> ApiResult<ApiResponse<()>> {
    state
        .items
        .reorder(&user.actor()?, &category_id, Some(menu_id), payload.item_ids)
        .await?;
    Ok(ApiResponse::message("Items reordered"))
}

/// GET /api/menus/{menu_id}/categories/{category_id}/items/{item_id}
pub async fn get_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((_menu_id, category_id, item_id)): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<ApiResponse<MenuItem>> {
    let item = state
        .items
        .get(&user.actor()?, &item_id, Some(category_id))
        .await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/menus/{menu_id}/categories/{category_id}/items/{item_id}
pub async fn update_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((_menu_id, category_id, item_id)): ApiPath<(Uuid, Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateMenuItem>,
) -> ApiResult<ApiResponse<MenuItem>> {
    let item = state
        .items
        .update(&user.actor()?, &item_id, Some(category_id), payload)
        .await?;
    Ok(ApiResponse::success_with_message(item, "Item updated"))
}

/// DELETE /api/menus/{menu_id}/categories/{category_id}/items/{item_id}
pub async fn delete_nested(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((_menu_id, category_id, item_id)): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<ApiResponse<()>> {
    state
        .items
        .delete(&user.actor()?, &item_id, Some(category_id))
        .await?;
    Ok(ApiResponse::message("Item deleted"))
}

/// GET /api/items/{item_id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<MenuItem>> {
    let item = state.items.get(&user.actor()?, &item_id, None).await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/items/{item_id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMenuItem>,
) -> ApiResult<ApiResponse<MenuItem>> {
    let item = state
        .items
        .update(&user.actor()?, &item_id, None, payload)
        .await?;
    Ok(ApiResponse::success_with_message(item, "Item updated"))
}

/// DELETE /api/items/{item_id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.items.delete(&user.actor()?, &item_id, None).await?;
    Ok(ApiResponse::message("Item deleted"))
}
