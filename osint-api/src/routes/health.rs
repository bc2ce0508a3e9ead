//! Health check endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    vendors_registered: usize,
    vendors_configured: usize,
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let vendors = state.registry.all_vendors();
    let configured = vendors
        .iter()
        .filter(|v| state.fetcher.is_configured(**v))
        .count();

    Json(HealthResponse {
        status: if configured > 0 { "healthy" } else { "degraded" },
        vendors_registered: vendors.len(),
        vendors_configured: configured,
    })
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{get, send, test_app};

    #[tokio::test]
    async fn test_liveness() {
        let (status, body) = send(test_app(), get("/api/health/live")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_health_counts_vendors() {
        let (status, body) = send(test_app(), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["vendors_registered"], 23);
        assert_eq!(json["vendors_configured"], 22);
    }
}
