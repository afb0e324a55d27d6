//! HTTP error mapping

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use qrest_core::error::DomainError;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Show internal error messages in responses. Enabled in development only.
pub fn expose_internal_errors(enabled: bool) {
    EXPOSE_INTERNAL_ERRORS.store(enabled, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests. Try again in {retry_after} seconds")]
    RateLimited { retry_after: u64 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    status_code: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Domain(err) => match err {
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::InvalidCredentials | DomainError::Unauthenticated(_) => {
                    StatusCode::UNAUTHORIZED
                }
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::EmailAlreadyExists(_)
                | DomainError::SlugAlreadyExists(_)
                | DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
                DomainError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
                DomainError::AiProviderError(_) => StatusCode::BAD_GATEWAY,
                DomainError::AiUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::PasswordHashError(_)
                | DomainError::TokenGenerationError(_)
                | DomainError::DatabaseError(_)
                | DomainError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "NotFound",
            ApiError::RateLimited { .. } => "TooManyRequests",
            ApiError::Domain(err) => match err {
                DomainError::NotFound(_) => "NotFound",
                DomainError::InvalidCredentials | DomainError::Unauthenticated(_) => "Unauthorized",
                DomainError::Forbidden(_) => "Forbidden",
                DomainError::EmailAlreadyExists(_)
                | DomainError::SlugAlreadyExists(_)
                | DomainError::Conflict(_) => "Conflict",
                DomainError::ValidationError(_) => "ValidationError",
                DomainError::InsufficientCredits { .. } => "Insufficient Credits",
                DomainError::AiProviderError(_) => "AiProviderError",
                DomainError::AiUnavailable(_) => "ServiceUnavailable",
                _ => "InternalServerError",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("{} {}", status.as_u16(), self);
            match &self {
                ApiError::Domain(DomainError::AiProviderError(_))
                | ApiError::Domain(DomainError::AiUnavailable(_)) => self.to_string(),
                _ if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) => self.to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            tracing::warn!("{} {}", status.as_u16(), self);
            self.to_string()
        };

        let body = Json(ErrorResponse {
            success: false,
            error: self.error_type().to_string(),
            message,
            status_code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Domain(errors.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
