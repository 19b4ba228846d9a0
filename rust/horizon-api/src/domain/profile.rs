//! User profiles and subscription plan limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Premium,
}

impl SubscriptionPlan {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    /// Parse the storage representation; unknown values fall back to free.
    #[must_use]
    pub fn parse_or_free(value: &str) -> Self {
        match value {
            "premium" => Self::Premium,
            _ => Self::Free,
        }
    }

    /// Limits for this plan.
    #[must_use]
    pub fn limits(&self) -> PlanLimits {
        match self {
            Self::Free => PlanLimits {
                max_missions: Some(3),
                mentor_messages_per_day: Some(40),
            },
            Self::Premium => PlanLimits {
                max_missions: None,
                mentor_messages_per_day: None,
            },
        }
    }
}

/// Per-plan usage limits. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum concurrently active missions.
    pub max_missions: Option<i64>,
    /// Maximum mentor chat messages per day.
    pub mentor_messages_per_day: Option<i64>,
}

/// Per-user display data and denormalized plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user (also the row key).
    pub user_id: String,
    /// Display name.
    pub display_name: Option<String>,
    /// IANA timezone name, informational only.
    pub timezone: Option<String>,
    /// Subscription plan.
    pub subscription_plan: SubscriptionPlan,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh free-tier profile.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            timezone: None,
            subscription_plan: SubscriptionPlan::Free,
            created_at: Utc::now(),
        }
    }
}
