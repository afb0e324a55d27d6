//! QR code handlers for a menu

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use qrest_core::domain::{QrCode, QrFormat};
use qrest_core::services::QrPreview;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQrRequest {
    pub style: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQrRequest {
    pub style: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub format: QrFormat,
}

/// GET /api/menus/{menu_id}/qr
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<QrCode>> {
    let qr = state.qr_codes.get(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::success(qr))
}

/// POST /api/menus/{menu_id}/qr
///
/// Returns the existing code with 200 when the menu already has one.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    body: Bytes,
) -> ApiResult<Response> {
    // The body is optional; an empty POST uses the default style
    let style = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<GenerateQrRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
            .style
    };
    let (qr, created) = state
        .qr_codes
        .generate(&user.actor()?, &menu_id, style)
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ApiResponse::success(qr))).into_response())
}

/// PATCH /api/menus/{menu_id}/qr
pub async fn update_style(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateQrRequest>,
) -> ApiResult<ApiResponse<QrCode>> {
    let qr = state
        .qr_codes
        .update_style(&user.actor()?, &menu_id, payload.style)
        .await?;
    Ok(ApiResponse::success_with_message(qr, "QR code updated"))
}

/// GET /api/menus/{menu_id}/qr/preview
pub async fn preview(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<QrPreview>> {
    let preview = state.qr_codes.preview(&user.actor()?, &menu_id).await?;
    Ok(ApiResponse::success(preview))
}

/// GET /api/menus/{menu_id}/qr/download?format=png|svg
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(menu_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> ApiResult<Response> {
    let file = state
        .qr_codes
        .download(&user.actor()?, &menu_id, query.format)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.body,
    )
        .into_response())
}
