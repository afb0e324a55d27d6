//! Request extractors: bearer authentication, validated bodies, visitor metadata

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use qrest_core::domain::{Role, VisitorInfo};
use qrest_core::services::Actor;
use qrest_security::JwtService;

use crate::error::ApiError;

/// JSON body whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// JSON body that is deserialized and then validated.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Caller identified by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub org_id: Option<Uuid>,
    pub role: Option<Role>,
}

impl AuthUser {
    /// Organization-scoped identity. Users without a membership have none.
    pub fn actor(&self) -> Result<Actor, ApiError> {
        match (self.org_id, self.role) {
            (Some(org_id), Some(role)) => Ok(Actor::new(self.user_id, org_id, role)),
            _ => Err(ApiError::Forbidden("No organization context".into())),
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

        let jwt = Arc::<JwtService>::from_ref(state);
        let claims = jwt
            .verify_access_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
            org_id: claims.org_id,
            role: claims.role.as_deref().and_then(Role::from_str),
        })
    }
}

/// Platform administrator: token role OWNER or ADMIN.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    Arc<JwtService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        match user.role {
            Some(Role::Owner) | Some(Role::Admin) => Ok(AdminUser(user)),
            _ => Err(ApiError::Forbidden("Admin access required".into())),
        }
    }
}

/// Forwarded client address, falling back to the socket peer.
pub fn client_ip(headers: &HeaderMap, connect: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .or_else(|| connect.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

/// Visitor metadata recorded with public menu views.
pub struct Visitor(pub VisitorInfo);

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(Visitor(VisitorInfo {
            user_agent: header_str(header::USER_AGENT),
            referer: header_str(header::REFERER),
            ip_address: client_ip(
                &parts.headers,
                parts.extensions.get::<ConnectInfo<SocketAddr>>(),
            ),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        routing::get,
        Router,
    };
    use qrest_security::TokenSubject;
    use qrest_shared::config::JwtSettings;
    use tower::ServiceExt;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(&JwtSettings {
            access_secret: "access-secret-access-secret-0123456789".into(),
            refresh_secret: "refresh-secret-refresh-secret-0123456789".into(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            preview_token_expiry: 86400,
        }))
    }

    fn subject(role: Option<&str>) -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "staff@demo.com".into(),
            org_id: Some(Uuid::new_v4()),
            role: role.map(str::to_string),
        }
    }

    fn guarded_app(jwt: Arc<JwtService>) -> Router {
        Router::new()
            .route("/admin", get(|AdminUser(user): AdminUser| async move { user.email }))
            .route("/me", get(|user: AuthUser| async move { user.email }))
            .with_state(jwt)
    }

    async fn status_of(app: Router, uri: &str, token: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_admin_guard_by_role() {
        let jwt = jwt();
        for (role, expected) in [
            ("VIEWER", StatusCode::FORBIDDEN),
            ("EDITOR", StatusCode::FORBIDDEN),
            ("OWNER", StatusCode::OK),
            ("ADMIN", StatusCode::OK),
        ] {
            let token = jwt.generate_access_token(&subject(Some(role))).unwrap();
            let status = status_of(guarded_app(jwt.clone()), "/admin", Some(&token)).await;
            assert_eq!(status, expected, "role {}", role);
        }

        let token = jwt.generate_access_token(&subject(None)).unwrap();
        assert_eq!(
            status_of(guarded_app(jwt.clone()), "/admin", Some(&token)).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_auth_guard_rejects_missing_and_bad_tokens() {
        let jwt = jwt();
        for uri in ["/me", "/admin"] {
            assert_eq!(
                status_of(guarded_app(jwt.clone()), uri, None).await,
                StatusCode::UNAUTHORIZED
            );
            assert_eq!(
                status_of(guarded_app(jwt.clone()), uri, Some("garbage")).await,
                StatusCode::UNAUTHORIZED
            );
        }
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let jwt = jwt();
        let refresh = jwt.generate_refresh_token(&subject(Some("OWNER"))).unwrap();
        assert_eq!(
            status_of(guarded_app(jwt.clone()), "/me", Some(&refresh)).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(guarded_app(jwt.clone()), "/admin", Some(&refresh)).await,
            StatusCode::UNAUTHORIZED
        );

        let access = jwt.generate_access_token(&subject(Some("VIEWER"))).unwrap();
        assert_eq!(
            status_of(guarded_app(jwt), "/me", Some(&access)).await,
            StatusCode::OK
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers, None).as_deref(), Some("203.0.113.7"));

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers, None).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let peer = ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000)));
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(&peer)).as_deref(),
            Some("192.0.2.1")
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_actor_requires_organization() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "a@b.co".into(),
            org_id: None,
            role: None,
        };
        assert!(matches!(user.actor(), Err(ApiError::Forbidden(_))));

        let org_id = Uuid::new_v4();
        let user = AuthUser {
            org_id: Some(org_id),
            role: Some(Role::Editor),
            ..user
        };
        let actor = user.actor().unwrap();
        assert_eq!(actor.org_id, org_id);
        assert_eq!(actor.role, Role::Editor);
    }
}
