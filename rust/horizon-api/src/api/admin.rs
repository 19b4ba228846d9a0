//! Admin endpoints: demo data seed and reset.
//!
//! Both require the `admin` role in the `user_roles` table and are
//! refused outright in production.

use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::Local;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::database::SeedSummary;
use crate::AppState;

/// Admin routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/seed", post(seed_demo_data))
        .route("/api/v1/admin/reset", post(reset_demo_data))
}

async fn require_admin(state: &AppState, user: &AuthenticatedUser) -> Result<(), ApiError> {
    if state.config.is_production() {
        return Err(ApiError::Forbidden(
            "This endpoint is disabled in production".to_string(),
        ));
    }
    if !state.store.has_role(&user.user_id, "admin").await? {
        return Err(ApiError::Forbidden(
            "Unauthorized: Admin access required".to_string(),
        ));
    }
    Ok(())
}

/// Seed response.
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: SeedSummary,
}

/// Replace the caller's data with the demo set.
async fn seed_demo_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<SeedResponse>, ApiError> {
    require_admin(&state, &user).await?;

    let today = Local::now().date_naive();
    let summary = state.store.seed_demo_data(&user.user_id, today).await?;

    tracing::info!(user = %user.user_id, "Demo data seeded");
    Ok(Json(SeedResponse {
        success: true,
        summary,
    }))
}

/// Reset response.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
}

/// Delete all of the caller's data.
async fn reset_demo_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ResetResponse>, ApiError> {
    require_admin(&state, &user).await?;

    state.store.reset_user_data(&user.user_id).await?;

    tracing::info!(user = %user.user_id, "User data reset");
    Ok(Json(ResetResponse { success: true }))
}
