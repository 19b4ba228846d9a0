//! Profile endpoints: display data and denormalized plan.

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::domain::Profile;
use crate::validation::validate_mission_text;
use crate::AppState;

/// Profile routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/profile", get(get_profile).put(update_profile))
}

/// Fetch the caller's profile; a fresh free-tier profile when none has
/// been saved yet.
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .store
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| Profile::new(&user.user_id));
    Ok(Json(profile))
}

/// Profile update request. The subscription plan is managed by the
/// billing flow, not this endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Update display data, creating the profile on first write.
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    if let Some(name) = req.display_name.as_deref() {
        validate_mission_text(name).map_err(|r| ApiError::Validation(r.message))?;
    }

    let mut profile = state
        .store
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| Profile::new(&user.user_id));

    if req.display_name.is_some() {
        profile.display_name = req.display_name;
    }
    if req.timezone.is_some() {
        profile.timezone = req.timezone;
    }

    state.store.upsert_profile(&profile).await?;
    Ok(Json(profile))
}
