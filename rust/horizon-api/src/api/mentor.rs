//! Mentor chat endpoints.
//!
//! The chat handler owns the tool loop: when the assistant asks to save
//! a note or fetch micro-habit suggestions, the server executes the
//! tool, appends the result, and resumes the completion instead of
//! bouncing the call back to the client.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::auth::AuthenticatedUser;
use crate::domain::MentorNote;
use crate::mentor::{
    context, system_message, tool_result_message, user_message, ChatRequest, ToolCall,
};
use crate::validation::{truncate_text, validate_user_text, MAX_TEXT_LENGTH};
use crate::AppState;

/// Cap on server-side tool-loop iterations per chat request.
const MAX_TOOL_ROUNDS: usize = 3;

/// Mentor routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/mentor/chat", post(chat))
        .route("/api/v1/mentor/notes", get(list_notes))
}

/// One chat message from the client.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// Chat request.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub messages: Vec<IncomingMessage>,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

/// Talk to the mentor.
async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    if body.messages.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".to_string()));
    }
    for message in &body.messages {
        if message.role == "user" {
            validate_user_text(&message.content)?;
        }
    }

    // Plan limit: free tier gets a fixed number of mentor messages/day.
    let today = Local::now().date_naive();
    let plan = state.store.user_plan(&user.user_id).await?;
    if let Some(max) = plan.limits().mentor_messages_per_day {
        let used = state.store.count_mentor_notes_on(&user.user_id, today).await?;
        if used >= max {
            return Err(ApiError::Forbidden(
                "Daily mentor message limit reached for your plan.".to_string(),
            ));
        }
    }

    let user_context = context::build_user_context(&state.store, &user.user_id, today).await?;
    let system = context::chat_system_prompt(&user_context);

    let mut messages: Vec<Value> = vec![system_message(&system)];
    for message in &body.messages {
        match message.role.as_str() {
            "assistant" => messages.push(serde_json::json!({
                "role": "assistant",
                "content": message.content
            })),
            _ => messages.push(user_message(&message.content)),
        }
    }

    let mut last_content = None;
    for _ in 0..MAX_TOOL_ROUNDS {
        let reply = state
            .mentor
            .chat(ChatRequest {
                messages: messages.clone(),
                tools: context::chat_tools(),
                tool_choice: None,
            })
            .await?;

        let Some(call) = reply.tool_calls.first().cloned() else {
            return Ok(Json(ChatResponse {
                message: reply.content.unwrap_or_default(),
            }));
        };

        tracing::info!(tool = %call.name, "Mentor tool call requested");

        let result = run_tool(&state, &user.user_id, &call).await?;
        messages.push(reply.message.clone());
        messages.push(tool_result_message(&call.id, &result));
        last_content = reply.content;
    }

    Ok(Json(ChatResponse {
        message: last_content.unwrap_or_default(),
    }))
}

/// Execute one mentor tool call and return the tool result content.
async fn run_tool(
    state: &AppState,
    user_id: &str,
    call: &ToolCall,
) -> Result<String, ApiError> {
    match call.name.as_str() {
        "save_mentor_note" => {
            let text = call
                .arguments
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if text.is_empty() {
                return Ok("Note was empty; nothing saved".to_string());
            }
            let tags: Vec<String> = call
                .arguments
                .get("tags")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            let note = MentorNote::new(user_id, truncate_text(text, MAX_TEXT_LENGTH), tags);
            state.store.insert_mentor_note(&note).await?;
            Ok("Note saved successfully".to_string())
        }
        "suggest_micro_habits" => {
            let mission_id = call
                .arguments
                .get("mission_id")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(mission) = state.store.get_mission(user_id, mission_id).await? else {
                return Ok("Mission not found".to_string());
            };

            let prompt = format!(
                "For the mission \"{}\" ({}, {}), suggest 3 quick micro-habits (5-15 min each) \
                 the user can do today. Be specific and actionable.",
                mission.title, mission.mission_type, mission.cadence
            );
            let reply = state
                .mentor
                .chat(ChatRequest {
                    messages: vec![user_message(&prompt)],
                    tools: vec![context::micro_habits_tool()],
                    tool_choice: Some("suggest_micro_habits".to_string()),
                })
                .await?;
            let arguments = reply.forced_tool_arguments("suggest_micro_habits")?;
            Ok(arguments
                .get("habits")
                .cloned()
                .unwrap_or(Value::Array(Vec::new()))
                .to_string())
        }
        other => {
            tracing::warn!(tool = other, "Unknown mentor tool requested");
            Ok(format!("Unknown tool: {other}"))
        }
    }
}

/// List recent mentor notes.
async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<MentorNote>>, ApiError> {
    let notes = state.store.recent_mentor_notes(&user.user_id, 20).await?;
    Ok(Json(notes))
}
