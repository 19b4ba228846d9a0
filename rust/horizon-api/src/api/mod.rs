//! HTTP API endpoints.

pub mod admin;
pub mod error;
pub mod health;
pub mod instances;
pub mod mentor;
pub mod missions;
pub mod profile;
pub mod pulse;
pub mod stats;

use axum::Router;

use crate::AppState;

/// Create the router for all bearer-authenticated routes.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .merge(missions::router())
        .merge(instances::router())
        .merge(pulse::router())
        .merge(mentor::router())
        .merge(stats::router())
        .merge(profile::router())
        .merge(admin::router())
}
