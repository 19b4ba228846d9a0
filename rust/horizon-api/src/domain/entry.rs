//! Daily pulse entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One mood/reflection entry per (user, calendar date). Upserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Unique entry identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Calendar date this entry is for.
    pub date: NaiveDate,
    /// Mood score, 1–5.
    pub mood: Option<i64>,
    /// Free-text reflection.
    pub reflections: Option<String>,
    /// AI-generated reflective prompt for the day.
    pub ai_prompt: Option<String>,
    /// AI-generated micro-habit suggestion for the day.
    pub ai_suggestion: Option<String>,
    /// Whether the pulse was completed for the day.
    pub completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl DailyEntry {
    /// Create an empty entry for a date.
    pub fn new(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            date,
            mood: None,
            reflections: None,
            ai_prompt: None,
            ai_suggestion: None,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// Valid mood range for a pulse entry.
pub const MOOD_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
