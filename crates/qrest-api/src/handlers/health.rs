use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::ServerInfo;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    /// Seconds since the server started.
    uptime: f64,
    environment: String,
    version: &'static str,
}

/// GET /api/health
pub async fn health_check(State(server): State<ServerInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        uptime: server.started_at.elapsed().as_secs_f64(),
        environment: server.environment,
        version: server.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, body::to_bytes, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_environment() {
        let app = Router::new()
            .route("/api/health", get(health_check))
            .with_state(ServerInfo::new("test"));

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["environment"], "test");
        assert!(json["uptime"].as_f64().unwrap() >= 0.0);
    }
}
