//! Email verification and password reset handlers

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use qrest_core::services::{ResetLink, ResetTokenStatus, VerificationLink};

use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// POST /api/auth/send-verification
pub async fn send_verification(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<VerificationLink>> {
    let link = state.account.send_verification(&user.user_id).await?;
    Ok(ApiResponse::success_with_message(link, "Verification email sent"))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<VerificationLink>> {
    let link = state.account.send_verification(&user.user_id).await?;
    Ok(ApiResponse::success_with_message(link, "Verification email resent"))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TokenRequest>,
) -> ApiResult<ApiResponse<()>> {
    state.account.verify_email(&payload.token).await?;
    Ok(ApiResponse::message("Email verified successfully"))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<ApiResponse<ResetLink>> {
    let link = state.account.forgot_password(&payload.email).await?;
    Ok(ApiResponse::success_with_message(
        link,
        "If an account exists with this email, a password reset link has been sent",
    ))
}

/// POST /api/auth/verify-reset-token
pub async fn verify_reset_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TokenRequest>,
) -> ApiResult<ApiResponse<ResetTokenStatus>> {
    let status = state.account.verify_reset_token(&payload.token).await?;
    Ok(ApiResponse::success(status))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .account
        .reset_password(&payload.token, &payload.password)
        .await?;
    Ok(ApiResponse::message("Password reset successfully"))
}
