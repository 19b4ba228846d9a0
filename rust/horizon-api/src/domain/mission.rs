//! Mission domain model.
//!
//! A mission is a user's tracked habit: a title, a life category, a
//! recurrence cadence, and a per-claim reward. Missions are soft-
//! deactivated, never destroyed, so completion history stays intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// XP granted by a quick-win check-in.
pub const CHECKIN_XP: i64 = 10;

/// Mission XP needed per level: `level = xp / 100 + 1`.
pub const XP_PER_LEVEL: i64 = 100;

/// Life category a mission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionType {
    Mind,
    Body,
    Craft,
    Relationships,
    Finance,
    Spirit,
    Custom,
}

impl MissionType {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mind => "Mind",
            Self::Body => "Body",
            Self::Craft => "Craft",
            Self::Relationships => "Relationships",
            Self::Finance => "Finance",
            Self::Spirit => "Spirit",
            Self::Custom => "Custom",
        }
    }

    /// Parse the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Mind" => Some(Self::Mind),
            "Body" => Some(Self::Body),
            "Craft" => Some(Self::Craft),
            "Relationships" => Some(Self::Relationships),
            "Finance" => Some(Self::Finance),
            "Spirit" => Some(Self::Spirit),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for MissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a mission recurs.
///
/// A closed enumeration: free-text cadence strings are rejected at the
/// API boundary rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
    Seasonal,
}

impl Cadence {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Seasonal => "seasonal",
        }
    }

    /// Parse the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "seasonal" => Some(Self::Seasonal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's tracked habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    /// Unique mission identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Mission title.
    pub title: String,
    /// Life category.
    pub mission_type: MissionType,
    /// Why this mission matters (optional, user-supplied or AI-proposed).
    pub intent: Option<String>,
    /// Recurrence cadence.
    pub cadence: Cadence,
    /// Target completions per week.
    pub target_per_week: i64,
    /// Accumulated mission XP from quick-win check-ins.
    pub xp: i64,
    /// Mission level derived from accumulated XP.
    pub level: i64,
    /// XP awarded per claimed instance.
    pub reward_xp: i64,
    /// Coins awarded per claimed instance.
    pub reward_coins: i64,
    /// Active flag; deactivation is a soft delete.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Mission {
    /// Create a new active mission with default progression state.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        mission_type: MissionType,
        cadence: Cadence,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            mission_type,
            intent: None,
            cadence,
            target_per_week: 7,
            xp: 0,
            level: 1,
            reward_xp: 50,
            reward_coins: 10,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Level implied by an XP total.
    #[must_use]
    pub fn level_for_xp(xp: i64) -> i64 {
        xp / XP_PER_LEVEL + 1
    }
}
