//! User stats and the canonical streak updater.
//!
//! One stats row per user: XP/coin totals, the daily streak, and the
//! freeze-token bookkeeping that lets a single missed day pass without
//! breaking the streak. Daily-cadence claims and daily pulse
//! completions both advance the same counter through [`StreakState::advance`];
//! there is no second streak definition.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Aggregated per-user totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    /// Owning user.
    pub user_id: String,
    /// Lifetime XP from claimed mission instances.
    pub xp_total: i64,
    /// Lifetime coins from claimed mission instances.
    pub coins_total: i64,
    /// Current run of consecutive qualifying days.
    pub daily_streak: i64,
    /// Last date a daily claim or pulse completion counted.
    pub last_daily_date: Option<NaiveDate>,
    /// Freeze tokens available to bridge a single missed day.
    pub freeze_tokens: i64,
    /// Last date bridged by a freeze token.
    pub last_freeze_date: Option<NaiveDate>,
}

impl UserStats {
    /// Empty stats for a user with no history yet.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Streak-relevant slice of the stats row.
    #[must_use]
    pub fn streak_state(&self) -> StreakState {
        StreakState {
            streak: self.daily_streak,
            last_date: self.last_daily_date,
            freeze_tokens: self.freeze_tokens,
            last_freeze_date: self.last_freeze_date,
        }
    }

    /// Apply an advanced streak state back onto the stats row.
    pub fn apply_streak(&mut self, state: StreakState) {
        self.daily_streak = state.streak;
        self.last_daily_date = state.last_date;
        self.freeze_tokens = state.freeze_tokens;
        self.last_freeze_date = state.last_freeze_date;
    }
}

/// The streak counter and its freeze bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    /// Current streak length.
    pub streak: i64,
    /// Last counted date.
    pub last_date: Option<NaiveDate>,
    /// Freeze tokens remaining.
    pub freeze_tokens: i64,
    /// Last date bridged by a freeze token.
    pub last_freeze_date: Option<NaiveDate>,
}

impl StreakState {
    /// Advance the streak for a qualifying action on `today`.
    ///
    /// - first ever action → streak 1
    /// - already counted today → no-op
    /// - last counted yesterday → increment
    /// - exactly one missed day with a freeze token available → the
    ///   token is spent on the missed day and the streak continues
    /// - otherwise → reset to 1
    #[must_use]
    pub fn advance(mut self, today: NaiveDate) -> Self {
        let yesterday = today - Days::new(1);

        match self.last_date {
            None => {
                self.streak = 1;
            }
            // Already counted today, or a backfilled older date: no-op.
            Some(last) if last >= today => {
                return self;
            }
            Some(last) if last == yesterday => {
                self.streak += 1;
            }
            Some(last) if last == today - Days::new(2) && self.freeze_tokens > 0 => {
                self.freeze_tokens -= 1;
                self.last_freeze_date = Some(yesterday);
                self.streak += 1;
            }
            Some(_) => {
                self.streak = 1;
            }
        }

        self.last_date = Some(today);
        self
    }
}
