//! Daily pulse endpoints: entry upsert and AI generation.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::domain::badge::Badge;
use crate::domain::entry::{DailyEntry, MOOD_RANGE};
use crate::mentor::{context, system_message, user_message, ChatRequest};
use crate::validation::validate_user_text;
use crate::AppState;

/// Pulse routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/pulse/generate", post(generate_pulse))
        .route("/api/v1/pulse/{date}", get(get_entry).put(upsert_entry))
}

fn parse_entry_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation("Date must be YYYY-MM-DD".to_string()))
}

/// Fetch the entry for a date.
async fn get_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(date): Path<String>,
) -> Result<Json<DailyEntry>, ApiError> {
    let date = parse_entry_date(&date)?;
    state
        .store
        .get_entry(&user.user_id, date)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No entry for that date".to_string()))
}

/// Entry upsert request.
#[derive(Debug, Deserialize)]
pub struct UpsertEntryRequest {
    #[serde(default)]
    pub mood: Option<i64>,
    #[serde(default)]
    pub reflections: Option<String>,
    /// Marking completed is one-way and advances the daily streak.
    #[serde(default)]
    pub completed: bool,
}

/// Entry upsert response.
#[derive(Debug, Serialize)]
pub struct UpsertEntryResponse {
    #[serde(flatten)]
    pub entry: DailyEntry,
    /// Badges newly earned by the post-completion sweep.
    pub new_badges: Vec<Badge>,
}

/// Upsert the entry for a date.
async fn upsert_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(date): Path<String>,
    Json(req): Json<UpsertEntryRequest>,
) -> Result<Json<UpsertEntryResponse>, ApiError> {
    let date = parse_entry_date(&date)?;

    if let Some(mood) = req.mood {
        if !MOOD_RANGE.contains(&mood) {
            return Err(ApiError::Validation("Mood must be between 1 and 5".to_string()));
        }
    }
    if let Some(reflections) = req.reflections.as_deref() {
        validate_user_text(reflections)?;
    }

    let entry = state
        .store
        .upsert_entry(&user.user_id, date, req.mood, req.reflections, req.completed)
        .await?;

    let new_badges = if req.completed {
        state.store.evaluate_badges(&user.user_id).await?
    } else {
        Vec::new()
    };

    Ok(Json(UpsertEntryResponse { entry, new_badges }))
}

/// Pulse generation request.
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePulseRequest {
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

/// Pulse generation response.
#[derive(Debug, Serialize)]
pub struct GeneratePulseResponse {
    pub ai_prompt: String,
    pub ai_suggestion: String,
}

/// Generate and persist the day's reflective prompt and micro-habit.
async fn generate_pulse(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<GeneratePulseRequest>,
) -> Result<Json<GeneratePulseResponse>, ApiError> {
    let date = match req.date.as_deref() {
        Some(raw) => parse_entry_date(raw)?,
        None => Local::now().date_naive(),
    };

    tracing::info!(user = %user.user_id, %date, "Generating daily pulse");

    let missions = state.store.list_missions(&user.user_id, true).await?;
    let missions_summary = if missions.is_empty() {
        "No active missions".to_string()
    } else {
        missions
            .iter()
            .map(|m| format!("{} ({}, {})", m.title, m.mission_type, m.cadence))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let week_ago = date - Days::new(7);
    let recent = state.store.recent_entries(&user.user_id, week_ago, 7).await?;
    let recent_reflections = if recent.is_empty() {
        "No recent entries".to_string()
    } else {
        recent
            .iter()
            .take(3)
            .map(|entry| {
                let mut line = format!("{}: Mood {}/5", entry.date, entry.mood.unwrap_or(0));
                if let Some(reflections) = &entry.reflections {
                    let preview: String = reflections.chars().take(100).collect();
                    line.push_str(&format!(", \"{preview}...\""));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let system = context::pulse_system_prompt(date, &missions_summary, &recent_reflections);
    let reply = state
        .mentor
        .chat(ChatRequest {
            messages: vec![
                system_message(&system),
                user_message("Create today's daily pulse for this user."),
            ],
            tools: vec![context::pulse_tool()],
            tool_choice: Some("generate_daily_pulse".to_string()),
        })
        .await?;

    let arguments = reply.forced_tool_arguments("generate_daily_pulse")?;
    let ai_prompt = arguments
        .get("ai_prompt")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            ApiError::Gateway(crate::mentor::GatewayError::InvalidResponse(
                "missing ai_prompt".to_string(),
            ))
        })?
        .to_string();
    let ai_suggestion = arguments
        .get("ai_suggestion")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            ApiError::Gateway(crate::mentor::GatewayError::InvalidResponse(
                "missing ai_suggestion".to_string(),
            ))
        })?
        .to_string();

    state
        .store
        .set_entry_ai(&user.user_id, date, &ai_prompt, &ai_suggestion)
        .await?;

    Ok(Json(GeneratePulseResponse {
        ai_prompt,
        ai_suggestion,
    }))
}
