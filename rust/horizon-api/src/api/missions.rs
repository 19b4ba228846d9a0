//! Mission endpoints: CRUD, instance rolling, check-ins, AI proposals.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::database::{CheckinOutcome, CheckinSummary};
use crate::domain::badge::Badge;
use crate::domain::mission::{Cadence, Mission, MissionType};
use crate::domain::period_key;
use crate::mentor::{context, system_message, user_message, ChatRequest};
use crate::validation::{truncate_text, validate_mission_text, validate_user_text, MAX_NOTE_LENGTH};
use crate::AppState;

/// Mission routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/missions", post(create_mission).get(list_missions))
        .route(
            "/api/v1/missions/{id}",
            get(get_mission).delete(deactivate_mission),
        )
        .route("/api/v1/missions/roll", post(roll_instances))
        .route("/api/v1/missions/{id}/checkin", post(log_checkin))
        .route("/api/v1/missions/propose", post(propose_missions))
}

/// Mission creation request.
#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    pub cadence: Cadence,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub target_per_week: Option<i64>,
    #[serde(default)]
    pub reward_xp: Option<i64>,
    #[serde(default)]
    pub reward_coins: Option<i64>,
}

/// Create a mission, subject to the caller's plan limit.
async fn create_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateMissionRequest>,
) -> Result<Json<Mission>, ApiError> {
    validate_mission_text(&req.title).map_err(|r| ApiError::Validation(r.message))?;
    if let Some(intent) = &req.intent {
        validate_mission_text(intent).map_err(|r| ApiError::Validation(r.message))?;
    }

    let plan = state.store.user_plan(&user.user_id).await?;
    if let Some(max) = plan.limits().max_missions {
        let active = state.store.count_active_missions(&user.user_id).await?;
        if active >= max {
            return Err(ApiError::Forbidden(format!(
                "Your plan allows up to {max} active missions. Upgrade to add more."
            )));
        }
    }

    let mut mission = Mission::new(&user.user_id, &req.title, req.mission_type, req.cadence);
    mission.intent = req.intent;
    if let Some(target) = req.target_per_week {
        mission.target_per_week = target.clamp(1, 7);
    }
    if let Some(xp) = req.reward_xp {
        mission.reward_xp = xp.max(0);
    }
    if let Some(coins) = req.reward_coins {
        mission.reward_coins = coins.max(0);
    }

    state.store.create_mission(&mission).await?;
    Ok(Json(mission))
}

/// List the caller's active missions.
async fn list_missions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Mission>>, ApiError> {
    let missions = state.store.list_missions(&user.user_id, true).await?;
    Ok(Json(missions))
}

/// Fetch one mission.
async fn get_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<Mission>, ApiError> {
    state
        .store
        .get_mission(&user.user_id, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Mission not found".to_string()))
}

/// Soft-deactivate a mission.
async fn deactivate_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.store.deactivate_mission(&user.user_id, &id).await?;
    if !removed {
        return Err(ApiError::NotFound("Mission not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Roll request.
#[derive(Debug, Deserialize)]
pub struct RollRequest {
    pub cadence: Cadence,
}

/// Roll response.
#[derive(Debug, Serialize)]
pub struct RollResponse {
    pub success: bool,
    pub created: usize,
    pub period_id: String,
}

/// Ensure the caller's active missions of a cadence have instances for
/// the current period.
async fn roll_instances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<RollRequest>,
) -> Result<Json<RollResponse>, ApiError> {
    let today = Local::now().date_naive();
    let period_id = period_key(req.cadence, today);

    tracing::info!(cadence = %req.cadence, period = %period_id, "Rolling instances");

    let created = state
        .store
        .roll_instances(&user.user_id, req.cadence, &period_id)
        .await?;

    Ok(Json(RollResponse {
        success: true,
        created,
        period_id,
    }))
}

/// Check-in request.
#[derive(Debug, Default, Deserialize)]
pub struct CheckinRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Check-in response.
#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    #[serde(flatten)]
    pub summary: CheckinSummary,
    /// Badges newly earned by the post-check-in sweep.
    pub new_badges: Vec<Badge>,
}

/// Log a quick win against a mission.
async fn log_checkin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<CheckinRequest>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let note = match req.note.as_deref() {
        Some(text) if !text.is_empty() => {
            validate_user_text(text)?;
            Some(truncate_text(text, MAX_NOTE_LENGTH).to_string())
        }
        _ => None,
    };

    let outcome = state.store.log_checkin(&user.user_id, &id, note).await?;
    let summary = match outcome {
        CheckinOutcome::Logged(summary) => summary,
        CheckinOutcome::MissionNotFound => {
            return Err(ApiError::NotFound("Mission not found".to_string()));
        }
    };

    let new_badges = state.store.evaluate_badges(&user.user_id).await?;

    Ok(Json(CheckinResponse {
        summary,
        new_badges,
    }))
}

/// Mission proposal request.
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub focus_areas: Vec<String>,
    pub why_now: String,
    pub minutes_per_day: u32,
    #[serde(default)]
    pub days_per_week: Vec<String>,
    pub coach_tone: String,
}

/// One AI-proposed mission.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProposedMission {
    pub title: String,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    pub cadence: Cadence,
    pub target_per_week: i64,
    pub intent: String,
}

/// Mission proposal response.
#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub missions: Vec<ProposedMission>,
}

/// Ask the mentor for three personalized mission proposals.
async fn propose_missions(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Json(req): Json<ProposeRequest>,
) -> Result<Json<ProposeResponse>, ApiError> {
    validate_user_text(&req.why_now)?;
    if req.focus_areas.is_empty() {
        return Err(ApiError::Validation(
            "At least one focus area is required".to_string(),
        ));
    }

    let system = context::propose_system_prompt(
        &req.focus_areas,
        &req.why_now,
        req.minutes_per_day,
        &req.coach_tone,
    );
    let user_prompt = format!(
        "Create 3 missions for someone who:\n\
         - Wants to focus on: {}\n\
         - Their why: {}\n\
         - Has {} minutes per day\n\
         - Available days: {}\n\
         - Prefers {} coaching tone",
        req.focus_areas.join(", "),
        req.why_now,
        req.minutes_per_day,
        req.days_per_week.join(", "),
        req.coach_tone
    );

    let reply = state
        .mentor
        .chat(ChatRequest {
            messages: vec![system_message(&system), user_message(&user_prompt)],
            tools: vec![context::propose_tool()],
            tool_choice: Some("propose_missions".to_string()),
        })
        .await?;

    let arguments = reply.forced_tool_arguments("propose_missions")?;
    let missions: Vec<ProposedMission> =
        serde_json::from_value(arguments.get("missions").cloned().unwrap_or_default()).map_err(
            |e| {
                ApiError::Gateway(crate::mentor::GatewayError::InvalidResponse(format!(
                    "malformed mission proposals: {e}"
                )))
            },
        )?;

    Ok(Json(ProposeResponse { missions }))
}
