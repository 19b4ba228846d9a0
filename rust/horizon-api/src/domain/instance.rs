//! Mission instance lifecycle.
//!
//! One occurrence of a mission within one period, tracked through
//! `available → completed → claimed`. `claimed` is terminal. At most
//! one instance exists per (mission, user, period); the storage layer
//! enforces this with a uniqueness constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a mission instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Rolled for the current period, not yet acted on.
    Available,
    /// Marked done by the user; reward not yet granted.
    Completed,
    /// Reward granted. Terminal.
    Claimed,
}

impl InstanceStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Completed => "completed",
            Self::Claimed => "claimed",
        }
    }

    /// Parse the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "completed" => Some(Self::Completed),
            "claimed" => Some(Self::Claimed),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One period's occurrence of a mission for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionInstance {
    /// Unique instance identifier.
    pub id: String,
    /// The mission this instance belongs to.
    pub mission_id: String,
    /// Owning user.
    pub user_id: String,
    /// Canonical period key this instance was rolled for.
    pub period_id: String,
    /// Current lifecycle status.
    pub status: InstanceStatus,
    /// When the instance was rolled.
    pub created_at: DateTime<Utc>,
    /// When the user marked it done.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the reward was claimed.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl MissionInstance {
    /// Create a fresh `available` instance for a period.
    pub fn new(
        mission_id: impl Into<String>,
        user_id: impl Into<String>,
        period_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mission_id: mission_id.into(),
            user_id: user_id.into(),
            period_id: period_id.into(),
            status: InstanceStatus::Available,
            created_at: Utc::now(),
            completed_at: None,
            claimed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            InstanceStatus::Available,
            InstanceStatus::Completed,
            InstanceStatus::Claimed,
        ] {
            assert_eq!(InstanceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InstanceStatus::parse("pending"), None);
    }

    #[test]
    fn new_instances_start_available() {
        let instance = MissionInstance::new("m-1", "u-1", "2025-01-06");
        assert_eq!(instance.status, InstanceStatus::Available);
        assert!(instance.completed_at.is_none());
        assert!(instance.claimed_at.is_none());
    }
}
