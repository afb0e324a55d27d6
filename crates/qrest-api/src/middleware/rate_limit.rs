//! Fixed-window rate limiting keyed by user, client IP or `anonymous`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use qrest_core::ports::RateLimitStore;
use qrest_security::JwtService;
use qrest_shared::config::RateLimitSettings;

use crate::error::ApiError;
use crate::extractors::{bearer_token, client_ip};

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    jwt: Arc<JwtService>,
    max_requests: u64,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, jwt: Arc<JwtService>, settings: &RateLimitSettings) -> Self {
        Self {
            store,
            jwt,
            max_requests: settings.max_requests,
            window_secs: settings.window_secs,
        }
    }

    /// Authenticated callers are counted per user, everyone else per address.
    fn identifier(&self, headers: &HeaderMap, connect: Option<&ConnectInfo<SocketAddr>>) -> String {
        let user = bearer_token(headers)
            .and_then(|token| self.jwt.verify_access_token(token).ok())
            .map(|claims| claims.user_id.to_string());

        user.or_else(|| client_ip(headers, connect))
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let identifier = limiter.identifier(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
    );
    let key = format!("rate_limit:{}", identifier);

    let hit = match limiter.store.hit(&key, limiter.window_secs).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!("Rate limiter unavailable, allowing request: {}", e);
            return next.run(request).await;
        }
    };

    let remaining = limiter.max_requests.saturating_sub(hit.count);
    let mut response = if hit.count > limiter.max_requests {
        warn!("Rate limit exceeded for {}", key);
        ApiError::RateLimited {
            retry_after: hit.ttl_secs,
        }
        .into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(limiter.max_requests));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(hit.ttl_secs));
    response
}
