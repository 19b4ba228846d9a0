//! Mentor prompts, tool schemas, and user-context assembly.
//!
//! The mentor grounds its replies in the user's actual data: today's
//! pulse entry, the trailing week, active missions, and recent saved
//! notes, rendered into one context block that prefixes the system
//! prompt.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};

use crate::database::SqliteStore;

/// The mentor persona shared by every prompt.
pub const MENTOR_PERSONA: &str = "You are Horizon, an AI life mentor. You are supportive, \
concise, pragmatic, and bias toward smallest-viable actions. You ground suggestions in the \
user's missions, cadence, and recent mood trends. Limit output to useful, specific steps. \
Avoid therapy claims.";

/// How many recent notes the chat context includes.
const CONTEXT_NOTES: usize = 10;

/// How many trailing days of entries the context includes.
const CONTEXT_DAYS: u64 = 7;

/// Assemble the user-context block for mentor chat.
pub async fn build_user_context(
    store: &SqliteStore,
    user_id: &str,
    today: NaiveDate,
) -> Result<String> {
    let week_ago = today - Days::new(CONTEXT_DAYS);
    let today_entry = store.get_entry(user_id, today).await?;
    let recent = store
        .recent_entries(user_id, week_ago, CONTEXT_DAYS as usize)
        .await?;
    let missions = store.list_missions(user_id, true).await?;
    let notes = store.recent_mentor_notes(user_id, CONTEXT_NOTES).await?;

    let mut context = String::from("# User Context\n\n");

    if let Some(entry) = today_entry {
        context.push_str(&format!("## Today ({today})\n"));
        if let Some(mood) = entry.mood {
            context.push_str(&format!("Mood: {mood}/5\n"));
        }
        if let Some(reflections) = &entry.reflections {
            context.push_str(&format!("Reflections: \"{reflections}\"\n"));
        }
        if let Some(suggestion) = &entry.ai_suggestion {
            context.push_str(&format!("Suggestion given: \"{suggestion}\"\n"));
        }
        context.push('\n');
    }

    if !recent.is_empty() {
        context.push_str("## Recent Week\n");
        for entry in &recent {
            context.push_str(&format!(
                "- {}: Mood {}/5",
                entry.date,
                entry.mood.unwrap_or(0)
            ));
            if let Some(suggestion) = &entry.ai_suggestion {
                context.push_str(&format!(" | \"{suggestion}\""));
            }
            context.push('\n');
        }
        context.push('\n');
    }

    if !missions.is_empty() {
        context.push_str("## Active Missions\n");
        for mission in &missions {
            context.push_str(&format!(
                "- {} ({}, {}) - Level {}, {} XP, Target: {}/week\n",
                mission.title,
                mission.mission_type,
                mission.cadence,
                mission.level,
                mission.xp,
                mission.target_per_week
            ));
        }
        context.push('\n');
    }

    if !notes.is_empty() {
        context.push_str("## Recent Notes\n");
        for note in notes.iter().take(5) {
            context.push_str(&format!("- \"{}\"", note.note));
            if !note.tags.is_empty() {
                context.push_str(&format!(" [{}]", note.tags.join(", ")));
            }
            context.push('\n');
        }
        context.push('\n');
    }

    Ok(context)
}

/// System prompt for mentor chat.
#[must_use]
pub fn chat_system_prompt(context: &str) -> String {
    format!(
        "You are Horizon, the user's AI life mentor. Your personality:\n\
         - Supportive yet pragmatic\n\
         - Concise and direct (no fluff)\n\
         - Evidence-based (reference their actual data)\n\
         - Motivational with actionable advice\n\
         - Always end with a small, specific nudge they can act on today\n\n\
         {context}\n\
         Keep responses brief (2-4 sentences max). Focus on what they can do RIGHT NOW."
    )
}

/// Tool definitions offered to the chat mentor.
#[must_use]
pub fn chat_tools() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": "save_mentor_note",
                "description": "Save an important insight or reminder about the user",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string", "description": "The note content" },
                        "tags": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Optional tags like \"goal\", \"insight\", \"reminder\""
                        }
                    },
                    "required": ["text"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "suggest_micro_habits",
                "description": "Suggest quick actionable habits for a specific mission",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "mission_id": { "type": "string", "description": "The mission ID" }
                    },
                    "required": ["mission_id"]
                }
            }
        }),
    ]
}

/// System prompt for daily pulse generation.
#[must_use]
pub fn pulse_system_prompt(
    date: NaiveDate,
    missions_summary: &str,
    recent_reflections: &str,
) -> String {
    format!(
        "{MENTOR_PERSONA}\n\n\
         Today's date: {date}\n\n\
         User's active missions: {missions_summary}\n\n\
         Recent entries:\n{recent_reflections}\n\n\
         Generate:\n\
         1. A reflective prompt that encourages self-awareness and ties to their current missions\n\
         2. One realistic, specific micro-habit for today that supports one of their missions\n\n\
         Make it personal and actionable for their day."
    )
}

/// Tool definition for daily pulse extraction.
#[must_use]
pub fn pulse_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": "generate_daily_pulse",
            "description": "Generate daily reflection prompt and micro-habit suggestion",
            "parameters": {
                "type": "object",
                "properties": {
                    "ai_prompt": {
                        "type": "string",
                        "description": "A thoughtful reflective question or prompt for the user (1-2 sentences)"
                    },
                    "ai_suggestion": {
                        "type": "string",
                        "description": "A specific, actionable micro-habit for today (1 sentence, 5-15 min activity)"
                    }
                },
                "required": ["ai_prompt", "ai_suggestion"]
            }
        }
    })
}

/// System prompt for mission proposals.
#[must_use]
pub fn propose_system_prompt(
    focus_areas: &[String],
    why_now: &str,
    minutes_per_day: u32,
    coach_tone: &str,
) -> String {
    format!(
        "{MENTOR_PERSONA}\n\n\
         Based on their chosen focus areas, intent, available time, and preferred coaching \
         tone, propose 3 specific, actionable missions.\n\n\
         Guidelines:\n\
         - Each mission should be concrete and measurable\n\
         - Match the user's coach tone: {coach_tone}\n\
         - Consider their time constraint ({minutes_per_day} minutes/day)\n\
         - Align with their intent: {why_now}\n\
         - Focus areas: {}\n\n\
         Return missions that feel personal and achievable.",
        focus_areas.join(", ")
    )
}

/// Tool definition for mission-proposal extraction.
#[must_use]
pub fn propose_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": "propose_missions",
            "description": "Propose 3 personalized missions for the user",
            "parameters": {
                "type": "object",
                "properties": {
                    "missions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string", "description": "Clear, actionable mission title" },
                                "type": {
                                    "type": "string",
                                    "enum": ["Mind", "Body", "Craft", "Relationships", "Finance", "Spirit", "Custom"],
                                    "description": "Mission category"
                                },
                                "cadence": {
                                    "type": "string",
                                    "enum": ["daily", "weekly", "monthly", "seasonal"],
                                    "description": "How often the mission recurs"
                                },
                                "target_per_week": {
                                    "type": "integer",
                                    "description": "Number of times per week (1-7)",
                                    "minimum": 1,
                                    "maximum": 7
                                },
                                "intent": { "type": "string", "description": "One sentence explaining why this mission matters" }
                            },
                            "required": ["title", "type", "cadence", "target_per_week", "intent"]
                        },
                        "minItems": 3,
                        "maxItems": 3
                    }
                },
                "required": ["missions"]
            }
        }
    })
}

/// Tool definition for micro-habit extraction.
#[must_use]
pub fn micro_habits_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": "suggest_micro_habits",
            "description": "Suggest 3 micro-habits for a mission",
            "parameters": {
                "type": "object",
                "properties": {
                    "habits": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 3,
                        "maxItems": 3
                    }
                },
                "required": ["habits"]
            }
        }
    })
}
