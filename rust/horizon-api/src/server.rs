//! HTTP server setup and middleware.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::auth;
use crate::config::AppConfig;
use crate::database::SqliteStore;
use crate::logging::OpTimer;
use crate::mentor::{GatewayClient, MentorGateway};
use crate::{log_init_step, AppState};

/// Horizon API version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the application with all routes and middleware.
pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    tracing::info!(
        version = VERSION,
        environment = %config.environment,
        "Building Horizon API"
    );

    // [1/4] Open the store
    let step_timer = OpTimer::new("server", "store");
    let store = SqliteStore::new(PathBuf::from(&config.database.data_dir));
    store.init().await?;
    log_init_step!(1, 4, "Store", format!("SQLite at {}", config.database.data_dir));
    step_timer.finish();

    // [2/4] Mentor gateway
    let step_timer = OpTimer::new("server", "gateway");
    let gateway_info = format!(
        "{} ({}) {}",
        config.mentor.base_url,
        config.mentor.model,
        if config.mentor.api_key.is_some() {
            "key configured"
        } else {
            "no key - AI requests will fail"
        }
    );
    let mentor: Arc<dyn MentorGateway> = Arc::new(GatewayClient::new(config.mentor.clone()));
    log_init_step!(2, 4, "Mentor Gateway", gateway_info);
    step_timer.finish();

    // [3/4] Auth
    if config.auth.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not configured; all authenticated routes will reject");
    }
    log_init_step!(
        3,
        4,
        "Auth",
        if config.auth.jwt_secret.is_some() {
            "bearer tokens enabled"
        } else {
            "no secret configured"
        }
    );

    // [4/4] Router
    let state = AppState {
        config: Arc::new(config),
        store,
        mentor,
    };
    let app = build_router(state);
    log_init_step!(4, 4, "Router", "Routes + middleware configured");

    overall_timer.finish();
    Ok(app)
}

/// Build the router for a prepared [`AppState`].
///
/// Split from [`create_app`] so tests can wire an in-memory store and a
/// stub gateway.
pub fn build_router(state: AppState) -> Router {
    let timeout_secs = state.config.server.timeout_secs;

    let protected = api::protected_router().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth::auth_middleware,
    ));

    Router::new()
        .merge(api::health::router())
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
