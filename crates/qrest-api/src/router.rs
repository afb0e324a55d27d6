//! Route table and HTTP layer stack

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::{
    account, admin, ai, auth, category, dashboard, health, menu, menu_item, organization, public,
    qr_code, team, theme,
};
use crate::middleware::rate_limit;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/send-verification", post(account::send_verification))
        .route("/resend-verification", post(account::resend_verification))
        .route("/verify-email", post(account::verify_email))
        .route("/forgot-password", post(account::forgot_password))
        .route("/verify-reset-token", post(account::verify_reset_token))
        .route("/reset-password", post(account::reset_password))
}

fn organization_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(organization::current).patch(organization::update_current),
        )
        .route("/members", get(organization::members))
        .route("/members/{user_id}", delete(organization::remove_member))
        .route(
            "/members/{user_id}/role",
            patch(organization::update_member_role),
        )
        .route(
            "/{org_id}",
            get(organization::get_by_id).put(organization::update_by_id),
        )
        .route("/{org_id}/logs", get(organization::logs))
        .route("/{org_id}/logs/stats", get(organization::log_stats))
        .route("/{org_id}/ai/generate-description", post(ai::generate_description))
        .route("/{org_id}/ai/translate-item", post(ai::translate_item))
        .route("/{org_id}/ai/generate-menu", post(ai::generate_menu))
        .route("/{org_id}/ai/generate-image-prompt", post(ai::generate_image_prompt))
        .route("/{org_id}/ai/optimize-description", post(ai::optimize_description))
        .route("/{org_id}/ai/analyze-menu", post(ai::analyze_menu))
        .route("/{org_id}/ai/credits", get(ai::credits))
        .route("/{org_id}/ai/transactions", get(ai::transactions))
        .route("/{org_id}/ai/usage-stats", get(ai::usage_stats))
        .route("/{org_id}/ai/packages", get(ai::packages))
        .route("/{org_id}/ai/purchase-package", post(ai::purchase_package))
        .route("/{org_id}/ai/history", get(ai::history))
}

fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::list).post(menu::create))
        .route(
            "/{menu_id}",
            get(menu::get).put(menu::update).delete(menu::delete),
        )
        .route("/{menu_id}/duplicate", post(menu::duplicate))
        .route("/{menu_id}/preview-token", post(menu::preview_token))
        .route("/{menu_id}/analytics", get(menu::analytics))
        .route(
            "/{menu_id}/qr",
            get(qr_code::get)
                .post(qr_code::generate)
                .patch(qr_code::update_style),
        )
        .route("/{menu_id}/qr/preview", get(qr_code::preview))
        .route("/{menu_id}/qr/download", get(qr_code::download))
        .route(
            "/{menu_id}/categories",
            get(category::list).post(category::create),
        )
        .route("/{menu_id}/categories/reorder", put(category::reorder))
        .route(
            "/{menu_id}/categories/{category_id}",
            get(category::get_nested)
                .put(category::update_nested)
                .delete(category::delete_nested),
        )
        .route(
            "/{menu_id}/categories/{category_id}/items",
            get(menu_item::list).post(menu_item::create),
        )
        .route(
            "/{menu_id}/categories/{category_id}/items/reorder",
            put(menu_item::reorder),
        )
        .route(
            "/{menu_id}/categories/{category_id}/items/{item_id}",
            get(menu_item::get_nested)
                .put(menu_item::update_nested)
                .delete(menu_item::delete_nested),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/organizations", get(admin::list_organizations))
        .route(
            "/organizations/{id}",
            get(admin::get_organization).put(admin::update_organization),
        )
        .route(
            "/organizations/{id}/status",
            patch(admin::set_organization_status),
        )
        .route("/organizations/{id}/plan", patch(admin::set_organization_plan))
        .route("/stats/dashboard", get(admin::platform_stats))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/menus", get(admin::list_menus))
        .route(
            "/menus/{id}",
            get(admin::get_menu)
                .put(admin::update_menu)
                .delete(admin::delete_menu),
        )
        .route("/menus/{id}/stats", get(admin::menu_stats))
        .route(
            "/subscription-plans",
            get(admin::list_plans).post(admin::create_plan),
        )
        .route(
            "/subscription-plans/{id}",
            get(admin::get_plan)
                .put(admin::update_plan)
                .delete(admin::delete_plan),
        )
        .route(
            "/subscription-plans/{id}/toggle-active",
            patch(admin::toggle_plan_active),
        )
        .route(
            "/subscription-plans/{id}/toggle-public",
            patch(admin::toggle_plan_public),
        )
        .route(
            "/credit-packages",
            get(admin::list_packages).post(admin::create_package),
        )
        .route(
            "/credit-packages/{id}",
            get(admin::get_package)
                .put(admin::update_package)
                .delete(admin::delete_package),
        )
        .route(
            "/credit-packages/{id}/toggle-active",
            patch(admin::toggle_package_active),
        )
}

/// CORS policy for the configured origins. `*` allows any origin without credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderName::from_static("x-request-id"),
        ]);

    if allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router {
    let limited = Router::new()
        .nest("/auth", auth_routes())
        .nest("/organization", organization_routes())
        .route("/team/{org_id}/members", get(team::list_members))
        .route("/team/{org_id}/invite", post(team::invite))
        .route(
            "/team/{org_id}/members/{member_id}",
            put(team::update_role).delete(team::remove),
        )
        .nest("/menus", menu_routes())
        .route(
            "/categories/{category_id}",
            get(category::get)
                .put(category::update)
                .delete(category::delete),
        )
        .route("/categories/{category_id}/items", post(category::create_item))
        .route(
            "/items/{item_id}",
            get(menu_item::get)
                .put(menu_item::update)
                .delete(menu_item::delete),
        )
        .route("/public/menu/{short_id}", get(public::menu))
        .route("/public/menu/{short_id}/scan", post(public::track_scan))
        .route("/public/menu/preview/{menu_id}", get(public::preview))
        .route("/theme", get(theme::get).put(theme::update))
        .route("/dashboard/{org_id}/stats", get(dashboard::stats))
        .route(
            "/dashboard/{org_id}/recent-activity",
            get(dashboard::recent_activity),
        )
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(limited);

    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::default().include_headers(false)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let app: Router = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .fallback(not_found);

        let response = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
        assert_eq!(body["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app: Router = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .layer(cors_layer(&["http://localhost:3000".to_string()]));

        let response = app
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_other_origins() {
        let app: Router = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .layer(cors_layer(&["http://localhost:3000".to_string()]));

        let response = app
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
