// ============================================================================
// QRest API - Auth Handlers
// File: crates/qrest-api/src/handlers/auth.rs
// ============================================================================
//! Authentication HTTP handlers (register, login, refresh, logout, me)

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use qrest_core::services::{AuthResult, CurrentUser, RefreshResult, RegisterInput};
use qrest_shared::utils::SLUG_REGEX;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;

/// Register request payload
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Organization name is required"))]
    pub org_name: String,
    #[validate(
        length(min = 3, max = 50, message = "Slug must be at least 3 characters"),
        regex(path = *SLUG_REGEX, message = "Slug can only contain lowercase letters, numbers, and hyphens")
    )]
    pub org_slug: String,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<AuthResult>> {
    let result = state
        .auth
        .register(RegisterInput {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            organization_name: payload.org_name,
            organization_slug: payload.org_slug,
        })
        .await?;
    Ok(Created(result))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthResult>> {
    let result = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<ApiResponse<RefreshResult>> {
    let result = state.auth.refresh(&payload.refresh_token).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<ApiResponse<()>> {
    state.auth.logout(&payload.refresh_token).await?;
    Ok(ApiResponse::message("Logged out successfully"))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<ApiResponse<CurrentUser>> {
    let current = state.auth.current_user(&user.user_id).await?;
    Ok(ApiResponse::success(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "owner@bistro.com".into(),
            password: "longenough".into(),
            name: "Ada".into(),
            org_name: "Bistro".into(),
            org_slug: "bistro-1".into(),
        }
    }

    #[test]
    fn test_register_request_accepts_valid_payload() {
        assert!(register_request().validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_slug_and_password() {
        let request = RegisterRequest {
            password: "short".into(),
            org_slug: "Bad Slug".into(),
            ..register_request()
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("org_slug"));
    }

    #[test]
    fn test_register_request_reads_camel_case() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "password": "password1",
            "name": "A",
            "orgName": "Org",
            "orgSlug": "org"
        }))
        .unwrap();
        assert_eq!(request.org_slug, "org");
    }
}
