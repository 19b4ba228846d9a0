//! Mission instance endpoints: listing, completion, claiming.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::database::{ClaimOutcome, ClaimSummary, CompleteOutcome, InstanceWithMission};
use crate::domain::badge::Badge;
use crate::domain::mission::Cadence;
use crate::domain::{period_key, InstanceStatus};
use crate::AppState;

/// Instance routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/instances", get(list_instances))
        .route("/api/v1/instances/{id}/complete", post(complete_instance))
        .route("/api/v1/instances/{id}/claim", post(claim_instance))
}

/// Listing query: which cadence's current period to show.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub cadence: Cadence,
}

/// List the caller's instances for the current period of a cadence.
async fn list_instances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InstanceWithMission>>, ApiError> {
    let period_id = period_key(query.cadence, Local::now().date_naive());
    let instances = state.store.list_instances(&user.user_id, &period_id).await?;
    Ok(Json(instances))
}

/// Completion response.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub status: InstanceStatus,
}

/// Mark an instance complete.
async fn complete_instance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let outcome = state.store.complete_instance(&user.user_id, &id).await?;
    match outcome {
        CompleteOutcome::Completed | CompleteOutcome::AlreadyCompleted => {
            Ok(Json(CompleteResponse {
                status: InstanceStatus::Completed,
            }))
        }
        CompleteOutcome::AlreadyClaimed => Err(ApiError::Conflict(
            "Mission already claimed".to_string(),
        )),
        CompleteOutcome::NotFound => Err(ApiError::NotFound("Mission not found".to_string())),
    }
}

/// Claim response.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ClaimSummary,
    /// Badges newly earned by the post-claim sweep.
    pub new_badges: Vec<Badge>,
}

/// Claim a completed instance's reward.
async fn claim_instance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let today = Local::now().date_naive();
    let outcome = state.store.claim_instance(&user.user_id, &id, today).await?;

    let summary = match outcome {
        ClaimOutcome::Claimed(summary) => summary,
        ClaimOutcome::WrongState(status) => {
            return Err(match status {
                InstanceStatus::Available => {
                    ApiError::Conflict("Mission not completed yet".to_string())
                }
                _ => ApiError::Conflict("Mission already claimed".to_string()),
            });
        }
        ClaimOutcome::NotFound => {
            return Err(ApiError::NotFound("Mission not found".to_string()));
        }
    };

    let new_badges = state.store.evaluate_badges(&user.user_id).await?;

    Ok(Json(ClaimResponse {
        success: true,
        summary,
        new_badges,
    }))
}
