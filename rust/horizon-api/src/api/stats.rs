//! Stats, badges, and the weekly share card.

use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::{Days, Utc};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::domain::badge::Badge;
use crate::domain::UserStats;
use crate::mentor::{user_message, ChatRequest};
use crate::AppState;

/// Stats routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/stats", get(get_stats))
        .route("/api/v1/badges", get(list_badges))
        .route("/api/v1/horizon/weekly", get(weekly_share))
}

/// Fetch the caller's stats (zeroed defaults when no history yet).
async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserStats>, ApiError> {
    let stats = state.store.get_stats(&user.user_id).await?;
    Ok(Json(stats))
}

/// List the caller's earned badges.
async fn list_badges(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Badge>>, ApiError> {
    let badges = state.store.list_badges(&user.user_id).await?;
    Ok(Json(badges))
}

/// Weekly share card.
#[derive(Debug, Serialize)]
pub struct WeeklyShareResponse {
    pub display_name: String,
    pub streak: i64,
    pub top_mission: String,
    pub completions: i64,
    pub mentor_line: String,
}

/// Build the weekly share card: streak, top mission of the trailing
/// week, and a short AI mentor line.
async fn weekly_share(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<WeeklyShareResponse>, ApiError> {
    let display_name = state
        .store
        .get_profile(&user.user_id)
        .await?
        .and_then(|profile| profile.display_name)
        .unwrap_or_else(|| "Horizon User".to_string());

    let stats = state.store.get_stats(&user.user_id).await?;

    let week_ago = Utc::now() - Days::new(7);
    let (top_mission, completions) = state
        .store
        .top_mission_since(&user.user_id, week_ago)
        .await?
        .unwrap_or_else(|| ("No active missions".to_string(), 0));

    let prompt = format!(
        "Generate a short, motivational message (max 120 characters) for someone who has a \
         {}-day streak and completed {} actions on \"{}\" this week. Be supportive, concise, \
         and inspiring.",
        stats.daily_streak, completions, top_mission
    );
    let reply = state
        .mentor
        .chat(ChatRequest {
            messages: vec![user_message(&prompt)],
            tools: Vec::new(),
            tool_choice: None,
        })
        .await?;

    Ok(Json(WeeklyShareResponse {
        display_name,
        streak: stats.daily_streak,
        top_mission,
        completions,
        mentor_line: reply.content.unwrap_or_default(),
    }))
}
