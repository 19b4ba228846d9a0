//! Mentor notes: insights the AI mentor saves about the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved mentor insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorNote {
    /// Unique note identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Note content.
    pub note: String,
    /// Freeform tags, e.g. "goal", "insight", "reminder".
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MentorNote {
    /// Create a new note.
    pub fn new(user_id: impl Into<String>, note: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            note: note.into(),
            tags,
            created_at: Utc::now(),
        }
    }
}
