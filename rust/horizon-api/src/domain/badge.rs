//! Badges: one-time achievement markers.
//!
//! A badge is identified by a stable id string and awarded at most once
//! per user. The store enforces idempotency with a (user, badge id)
//! uniqueness constraint, so evaluators can re-run freely.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Seven consecutive completed daily entries.
pub const BADGE_STREAK_7: &str = "streak-7";

/// Thirty claimed mission completions.
pub const BADGE_CHECKINS_30: &str = "checkins-30";

/// Completions required for [`BADGE_CHECKINS_30`].
pub const CHECKINS_30_THRESHOLD: i64 = 30;

/// Consecutive days required for [`BADGE_STREAK_7`].
pub const STREAK_7_DAYS: usize = 7;

/// An earned badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    /// Stable badge identifier, e.g. `streak-7`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// When the badge was earned.
    pub earned_at: DateTime<Utc>,
}

impl Badge {
    /// The week-long streak badge.
    #[must_use]
    pub fn streak_7() -> Self {
        Self {
            id: BADGE_STREAK_7.to_string(),
            name: "Week Warrior".to_string(),
            description: "Seven days of showing up. That's a pattern.".to_string(),
            earned_at: Utc::now(),
        }
    }

    /// The thirty-completions badge.
    #[must_use]
    pub fn checkins_30() -> Self {
        Self {
            id: BADGE_CHECKINS_30.to_string(),
            name: "Consistency Champion".to_string(),
            description: "Thirty actions logged. Momentum builds on itself.".to_string(),
            earned_at: Utc::now(),
        }
    }

    /// The per-mission first level-up badge, awarded when a mission
    /// reaches level 2.
    #[must_use]
    pub fn first_levelup(mission_id: &str, mission_title: &str) -> Self {
        Self {
            id: format!("first-levelup-{mission_id}"),
            name: format!("{mission_title} Initiate"),
            description: format!("First level-up in {mission_title}!"),
            earned_at: Utc::now(),
        }
    }
}

/// Whether `dates` (most recent first) form a run of exactly
/// [`STREAK_7_DAYS`] pairwise-consecutive calendar days.
#[must_use]
pub fn is_week_streak(dates: &[NaiveDate]) -> bool {
    if dates.len() < STREAK_7_DAYS {
        return false;
    }
    dates
        .windows(2)
        .all(|pair| pair[1] + Days::new(1) == pair[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descending_run(start: NaiveDate, len: usize) -> Vec<NaiveDate> {
        (0..len).map(|i| start - Days::new(i as u64)).collect()
    }

    #[test]
    fn seven_consecutive_days_qualify() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert!(is_week_streak(&descending_run(today, 7)));
    }

    #[test]
    fn six_days_do_not_qualify() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert!(!is_week_streak(&descending_run(today, 6)));
    }

    #[test]
    fn a_gap_breaks_the_run() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let mut dates = descending_run(today, 7);
        // Push the oldest entry two days further back.
        dates[6] = dates[6] - Days::new(2);
        assert!(!is_week_streak(&dates));
    }

    #[test]
    fn levelup_badge_id_is_scoped_to_the_mission() {
        let badge = Badge::first_levelup("m-42", "Morning Meditation");
        assert_eq!(badge.id, "first-levelup-m-42");
        assert_eq!(badge.name, "Morning Meditation Initiate");
    }
}
