//! Health check endpoints.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    database: bool,
}

/// Readiness check.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<ReadinessResponse> {
    // The store answers a trivial query when it is usable.
    let database = state.store.get_stats("readiness-probe").await.is_ok();
    Json(ReadinessResponse {
        status: if database { "ready" } else { "degraded" },
        database,
    })
}
