use axum::extract::State;

use qrest_core::domain::ThemeSetting;
use qrest_core::services::UpdateTheme;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/theme
pub async fn get(State(state): State<AppState>, user: AuthUser) -> ApiResult<ApiResponse<ThemeSetting>> {
    let theme = state.themes.get(&user.actor()?).await?;
    Ok(ApiResponse::success(theme))
}

/// PUT /api/theme
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateTheme>,
) -> ApiResult<ApiResponse<ThemeSetting>> {
    let theme = state.themes.update(&user.actor()?, payload).await?;
    Ok(ApiResponse::success_with_message(theme, "Theme updated"))
}
