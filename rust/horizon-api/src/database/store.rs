//! SQLite store for the mission reward engine.
//!
//! One connection behind a coarse mutex, with blocking work routed
//! through `spawn_blocking`. Multi-step writes that must be exactly-once
//! (the claim flow, the instance roller, check-ins) each run inside a
//! single transaction; status transitions are guarded by compare-and-swap
//! updates so a concurrent duplicate request loses cleanly instead of
//! double-applying.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::database::schema::SQLITE_SCHEMA;
use crate::domain::badge::{is_week_streak, Badge, CHECKINS_30_THRESHOLD, STREAK_7_DAYS};
use crate::domain::mission::{Cadence, Mission, MissionType, CHECKIN_XP};
use crate::domain::{
    DailyEntry, InstanceStatus, MentorNote, Profile, SubscriptionPlan, UserStats,
};

/// Cap on instances per (user, cadence, period).
const MAX_INSTANCES_PER_PERIOD: i64 = 5;

/// Embedded SQLite store.
#[derive(Clone)]
pub struct SqliteStore {
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ready = self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false);
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("ready", &ready)
            .finish()
    }
}

/// Outcome of marking an instance complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// Transitioned `available → completed`.
    Completed,
    /// Already completed; treated as a no-op.
    AlreadyCompleted,
    /// Already claimed; completion is refused.
    AlreadyClaimed,
    /// No such instance for this user.
    NotFound,
}

/// Outcome of claiming an instance.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// Reward granted exactly once.
    Claimed(ClaimSummary),
    /// Instance was not in `completed` status.
    WrongState(InstanceStatus),
    /// No such instance for this user.
    NotFound,
}

/// What a successful claim changed.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimSummary {
    pub xp_awarded: i64,
    pub coins_awarded: i64,
    /// Stats row after the claim.
    pub stats: UserStats,
}

/// Outcome of logging a quick-win check-in.
#[derive(Debug, Clone)]
pub enum CheckinOutcome {
    Logged(CheckinSummary),
    MissionNotFound,
}

/// What a check-in changed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinSummary {
    pub xp_awarded: i64,
    pub mission_xp: i64,
    pub level: i64,
    pub leveled_up: bool,
    /// First level-up badge, if this check-in earned it.
    pub badge: Option<Badge>,
}

/// An instance joined with the mission detail the client renders.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceWithMission {
    pub id: String,
    pub mission_id: String,
    pub period_id: String,
    pub status: InstanceStatus,
    pub title: String,
    pub mission_type: MissionType,
    pub cadence: Cadence,
    pub reward_xp: i64,
    pub reward_coins: i64,
}

/// What demo seeding created.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeedSummary {
    pub missions: usize,
    pub entries: usize,
    pub checkins: usize,
}

impl SqliteStore {
    /// Create a store backed by `data_dir/horizon.sqlite`.
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            db_path: Some(data_dir.join("horizon.sqlite")),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Create an in-memory store (tests).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the connection and apply the schema.
    pub async fn init(&self) -> Result<()> {
        let this = self.conn.clone();
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut guard = this.lock().unwrap();
            if guard.is_some() {
                return Ok(());
            }

            let conn = match db_path {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let conn = Connection::open(&path)?;
                    // Enable WAL mode for concurrency
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn
                }
                None => Connection::open_in_memory()?,
            };

            conn.execute_batch(SQLITE_SCHEMA)?;
            *guard = Some(conn);
            Ok(())
        })
        .await
        .context("Tokio spawn_blocking failed")??;

        Ok(())
    }

    /// Run blocking database work on the shared connection.
    async fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let this = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let mut guard = this.lock().unwrap();
            let conn = guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("SQLite not initialized"))?;
            f(conn)
        })
        .await
        .context("Tokio spawn_blocking failed")?
    }

    // ------------------------------------------------------------------
    // Profiles and roles
    // ------------------------------------------------------------------

    /// Insert or replace a profile.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let profile = profile.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO profiles
                     (user_id, display_name, timezone, subscription_plan, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    profile.user_id,
                    profile.display_name,
                    profile.timezone,
                    profile.subscription_plan.as_str(),
                    format_datetime(profile.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Fetch a profile.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let profile = conn
                .query_row(
                    "SELECT user_id, display_name, timezone, subscription_plan, created_at
                     FROM profiles WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(Profile {
                            user_id: row.get(0)?,
                            display_name: row.get(1)?,
                            timezone: row.get(2)?,
                            subscription_plan: SubscriptionPlan::parse_or_free(
                                &row.get::<_, String>(3)?,
                            ),
                            created_at: parse_datetime(row.get(4)?),
                        })
                    },
                )
                .optional()?;
            Ok(profile)
        })
        .await
    }

    /// Subscription plan for a user; free when no profile exists.
    pub async fn user_plan(&self, user_id: &str) -> Result<SubscriptionPlan> {
        Ok(self
            .get_profile(user_id)
            .await?
            .map(|p| p.subscription_plan)
            .unwrap_or(SubscriptionPlan::Free))
    }

    /// Whether a user carries a role.
    pub async fn has_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let role = role.to_string();
        self.call(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM user_roles WHERE user_id = ?1 AND role = ?2",
                    params![user_id, role],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    /// Grant a role (idempotent).
    pub async fn grant_role(&self, user_id: &str, role: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let role = role.to_string();
        self.call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
                params![user_id, role],
            )?;
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Missions
    // ------------------------------------------------------------------

    /// Insert a mission.
    pub async fn create_mission(&self, mission: &Mission) -> Result<()> {
        let m = mission.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO missions
                     (id, user_id, title, mission_type, intent, cadence, target_per_week,
                      xp, level, reward_xp, reward_coins, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    m.id,
                    m.user_id,
                    m.title,
                    m.mission_type.as_str(),
                    m.intent,
                    m.cadence.as_str(),
                    m.target_per_week,
                    m.xp,
                    m.level,
                    m.reward_xp,
                    m.reward_coins,
                    m.active,
                    format_datetime(m.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// List a user's missions, optionally only active ones.
    pub async fn list_missions(&self, user_id: &str, active_only: bool) -> Result<Vec<Mission>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let sql = if active_only {
                "SELECT id, user_id, title, mission_type, intent, cadence, target_per_week,
                        xp, level, reward_xp, reward_coins, active, created_at
                 FROM missions WHERE user_id = ?1 AND active = 1 ORDER BY created_at"
            } else {
                "SELECT id, user_id, title, mission_type, intent, cadence, target_per_week,
                        xp, level, reward_xp, reward_coins, active, created_at
                 FROM missions WHERE user_id = ?1 ORDER BY created_at"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![user_id], mission_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    /// Fetch one mission owned by the user.
    pub async fn get_mission(&self, user_id: &str, mission_id: &str) -> Result<Option<Mission>> {
        let user_id = user_id.to_string();
        let mission_id = mission_id.to_string();
        self.call(move |conn| {
            let mission = conn
                .query_row(
                    "SELECT id, user_id, title, mission_type, intent, cadence, target_per_week,
                            xp, level, reward_xp, reward_coins, active, created_at
                     FROM missions WHERE id = ?1 AND user_id = ?2",
                    params![mission_id, user_id],
                    mission_from_row,
                )
                .optional()?;
            Ok(mission)
        })
        .await
    }

    /// Count a user's active missions (plan-limit checks).
    pub async fn count_active_missions(&self, user_id: &str) -> Result<i64> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM missions WHERE user_id = ?1 AND active = 1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
    }

    /// Soft-deactivate a mission. Returns false when it does not exist.
    pub async fn deactivate_mission(&self, user_id: &str, mission_id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let mission_id = mission_id.to_string();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE missions SET active = 0 WHERE id = ?1 AND user_id = ?2",
                params![mission_id, user_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Instance roller
    // ------------------------------------------------------------------

    /// Ensure each active mission of `cadence` has an instance for
    /// `period_id`, capped at [`MAX_INSTANCES_PER_PERIOD`] per (user,
    /// period). Duplicate inserts hit the uniqueness constraint and are
    /// ignored. Returns the number of instances created.
    pub async fn roll_instances(
        &self,
        user_id: &str,
        cadence: Cadence,
        period_id: &str,
    ) -> Result<usize> {
        let user_id = user_id.to_string();
        let period_id = period_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM mission_instances WHERE user_id = ?1 AND period_id = ?2",
                params![user_id, period_id],
                |row| row.get(0),
            )?;
            let budget = (MAX_INSTANCES_PER_PERIOD - existing).max(0);
            if budget == 0 {
                return Ok(0);
            }

            let mission_ids: Vec<String> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM missions
                     WHERE user_id = ?1 AND cadence = ?2 AND active = 1
                       AND id NOT IN (
                           SELECT mission_id FROM mission_instances
                           WHERE user_id = ?1 AND period_id = ?3)
                     ORDER BY created_at
                     LIMIT ?4",
                )?;
                let rows = stmt.query_map(
                    params![user_id, cadence.as_str(), period_id, budget],
                    |row| row.get(0),
                )?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            let now = format_datetime(Utc::now());
            let mut created = 0usize;
            for mission_id in mission_ids {
                created += tx.execute(
                    "INSERT INTO mission_instances
                         (id, mission_id, user_id, period_id, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, 'available', ?5)
                     ON CONFLICT (mission_id, user_id, period_id) DO NOTHING",
                    params![Uuid::new_v4().to_string(), mission_id, user_id, period_id, now],
                )?;
            }

            tx.commit()?;
            Ok(created)
        })
        .await
    }

    /// List a user's instances for a period, joined with mission detail.
    pub async fn list_instances(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<InstanceWithMission>> {
        let user_id = user_id.to_string();
        let period_id = period_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.mission_id, i.period_id, i.status,
                        m.title, m.mission_type, m.cadence, m.reward_xp, m.reward_coins
                 FROM mission_instances i
                 JOIN missions m ON m.id = i.mission_id
                 WHERE i.user_id = ?1 AND i.period_id = ?2
                 ORDER BY i.created_at",
            )?;
            let rows = stmt.query_map(params![user_id, period_id], |row| {
                Ok(InstanceWithMission {
                    id: row.get(0)?,
                    mission_id: row.get(1)?,
                    period_id: row.get(2)?,
                    status: InstanceStatus::parse(&row.get::<_, String>(3)?)
                        .unwrap_or(InstanceStatus::Available),
                    title: row.get(4)?,
                    mission_type: MissionType::parse(&row.get::<_, String>(5)?)
                        .unwrap_or(MissionType::Custom),
                    cadence: Cadence::parse(&row.get::<_, String>(6)?).unwrap_or(Cadence::Daily),
                    reward_xp: row.get(7)?,
                    reward_coins: row.get(8)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Completion / claim state machine
    // ------------------------------------------------------------------

    /// Mark an instance complete (`available → completed`).
    pub async fn complete_instance(
        &self,
        user_id: &str,
        instance_id: &str,
    ) -> Result<CompleteOutcome> {
        let user_id = user_id.to_string();
        let instance_id = instance_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let status: Option<String> = tx
                .query_row(
                    "SELECT status FROM mission_instances WHERE id = ?1 AND user_id = ?2",
                    params![instance_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match status.as_deref().and_then(InstanceStatus::parse) {
                None => CompleteOutcome::NotFound,
                Some(InstanceStatus::Claimed) => CompleteOutcome::AlreadyClaimed,
                Some(InstanceStatus::Completed) => CompleteOutcome::AlreadyCompleted,
                Some(InstanceStatus::Available) => {
                    let changed = tx.execute(
                        "UPDATE mission_instances
                         SET status = 'completed', completed_at = ?3
                         WHERE id = ?1 AND user_id = ?2 AND status = 'available'",
                        params![instance_id, user_id, format_datetime(Utc::now())],
                    )?;
                    if changed == 1 {
                        CompleteOutcome::Completed
                    } else {
                        CompleteOutcome::AlreadyCompleted
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    /// Claim a completed instance: flip the status, log the completion,
    /// and update stats — one transaction, exactly once. The status flip
    /// is a compare-and-swap, so a concurrent duplicate claim observes
    /// `WrongState(Claimed)` instead of a double award.
    pub async fn claim_instance(
        &self,
        user_id: &str,
        instance_id: &str,
        today: NaiveDate,
    ) -> Result<ClaimOutcome> {
        let user_id = user_id.to_string();
        let instance_id = instance_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row(
                    "SELECT i.status, m.reward_xp, m.reward_coins, m.cadence
                     FROM mission_instances i
                     JOIN missions m ON m.id = i.mission_id
                     WHERE i.id = ?1 AND i.user_id = ?2",
                    params![instance_id, user_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let Some((status, reward_xp, reward_coins, cadence)) = row else {
                return Ok(ClaimOutcome::NotFound);
            };
            let status = InstanceStatus::parse(&status).unwrap_or(InstanceStatus::Available);
            if status != InstanceStatus::Completed {
                return Ok(ClaimOutcome::WrongState(status));
            }

            let changed = tx.execute(
                "UPDATE mission_instances
                 SET status = 'claimed', claimed_at = ?3
                 WHERE id = ?1 AND user_id = ?2 AND status = 'completed'",
                params![instance_id, user_id, format_datetime(Utc::now())],
            )?;
            if changed == 0 {
                return Ok(ClaimOutcome::WrongState(InstanceStatus::Claimed));
            }

            tx.execute(
                "INSERT INTO mission_completions
                     (id, mission_instance_id, user_id, xp_awarded, coins_awarded, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    instance_id,
                    user_id,
                    reward_xp,
                    reward_coins,
                    format_datetime(Utc::now()),
                ],
            )?;

            let mut stats = read_stats(&tx, &user_id)?;
            stats.xp_total += reward_xp;
            stats.coins_total += reward_coins;
            if Cadence::parse(&cadence) == Some(Cadence::Daily) {
                let advanced = stats.streak_state().advance(today);
                stats.apply_streak(advanced);
            }
            write_stats(&tx, &stats)?;

            tx.commit()?;
            Ok(ClaimOutcome::Claimed(ClaimSummary {
                xp_awarded: reward_xp,
                coins_awarded: reward_coins,
                stats,
            }))
        })
        .await
    }

    // ------------------------------------------------------------------
    // Check-ins (quick wins, older XP/level model)
    // ------------------------------------------------------------------

    /// Log a quick win against a mission: append a check-in row, bump
    /// mission XP/level, and award the first level-up badge when the
    /// mission reaches level 2.
    pub async fn log_checkin(
        &self,
        user_id: &str,
        mission_id: &str,
        note: Option<String>,
    ) -> Result<CheckinOutcome> {
        let user_id = user_id.to_string();
        let mission_id = mission_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row(
                    "SELECT title, xp, level FROM missions
                     WHERE id = ?1 AND user_id = ?2 AND active = 1",
                    params![mission_id, user_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((title, xp, level)) = row else {
                return Ok(CheckinOutcome::MissionNotFound);
            };

            tx.execute(
                "INSERT INTO checkins (id, mission_id, user_id, note, xp_awarded, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    mission_id,
                    user_id,
                    note,
                    CHECKIN_XP,
                    format_datetime(Utc::now()),
                ],
            )?;

            let new_xp = xp + CHECKIN_XP;
            let new_level = Mission::level_for_xp(new_xp);
            tx.execute(
                "UPDATE missions SET xp = ?3, level = ?4 WHERE id = ?1 AND user_id = ?2",
                params![mission_id, user_id, new_xp, new_level],
            )?;

            let leveled_up = new_level > level;
            // First level-up only: the badge marks reaching level 2.
            let badge = if leveled_up && new_level == 2 {
                let badge = Badge::first_levelup(&mission_id, &title);
                award_badge(&tx, &user_id, &badge)?.then_some(badge)
            } else {
                None
            };

            tx.commit()?;
            Ok(CheckinOutcome::Logged(CheckinSummary {
                xp_awarded: CHECKIN_XP,
                mission_xp: new_xp,
                level: new_level,
                leveled_up,
                badge,
            }))
        })
        .await
    }

    /// Most-checked-in mission since `since`, with its count.
    pub async fn top_mission_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<(String, i64)>> {
        let user_id = user_id.to_string();
        let since = format_datetime(since);
        self.call(move |conn| {
            let top = conn
                .query_row(
                    "SELECT m.title, COUNT(*) AS completions
                     FROM checkins c
                     JOIN missions m ON m.id = c.mission_id
                     WHERE c.user_id = ?1 AND c.occurred_at >= ?2
                     GROUP BY c.mission_id, m.title
                     ORDER BY completions DESC
                     LIMIT 1",
                    params![user_id, since],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()?;
            Ok(top)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Daily entries
    // ------------------------------------------------------------------

    /// Fetch the entry for a date.
    pub async fn get_entry(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyEntry>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let entry = conn
                .query_row(
                    "SELECT id, user_id, date, mood, reflections, ai_prompt, ai_suggestion,
                            completed, created_at
                     FROM daily_entries WHERE user_id = ?1 AND date = ?2",
                    params![user_id, format_date(date)],
                    entry_from_row,
                )
                .optional()?;
            Ok(entry)
        })
        .await
    }

    /// Upsert the entry for a date. Newly marking it completed advances
    /// the daily streak inside the same transaction.
    pub async fn upsert_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
        mood: Option<i64>,
        reflections: Option<String>,
        completed: bool,
    ) -> Result<DailyEntry> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<(String, bool)> = tx
                .query_row(
                    "SELECT id, completed FROM daily_entries WHERE user_id = ?1 AND date = ?2",
                    params![user_id, format_date(date)],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let was_completed = existing.as_ref().is_some_and(|(_, done)| *done);
            let now_completed = was_completed || completed;

            match existing {
                Some((id, _)) => {
                    tx.execute(
                        "UPDATE daily_entries
                         SET mood = ?2, reflections = ?3, completed = ?4
                         WHERE id = ?1",
                        params![id, mood, reflections, now_completed],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO daily_entries
                             (id, user_id, date, mood, reflections, completed, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            Uuid::new_v4().to_string(),
                            user_id,
                            format_date(date),
                            mood,
                            reflections,
                            now_completed,
                            format_datetime(Utc::now()),
                        ],
                    )?;
                }
            }

            if completed && !was_completed {
                let mut stats = read_stats(&tx, &user_id)?;
                let advanced = stats.streak_state().advance(date);
                stats.apply_streak(advanced);
                write_stats(&tx, &stats)?;
            }

            let entry = tx.query_row(
                "SELECT id, user_id, date, mood, reflections, ai_prompt, ai_suggestion,
                        completed, created_at
                 FROM daily_entries WHERE user_id = ?1 AND date = ?2",
                params![user_id, format_date(date)],
                entry_from_row,
            )?;

            tx.commit()?;
            Ok(entry)
        })
        .await
    }

    /// Attach AI prompt/suggestion to a date's entry, creating it if
    /// needed.
    pub async fn set_entry_ai(
        &self,
        user_id: &str,
        date: NaiveDate,
        ai_prompt: &str,
        ai_suggestion: &str,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        let ai_prompt = ai_prompt.to_string();
        let ai_suggestion = ai_suggestion.to_string();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO daily_entries
                     (id, user_id, date, ai_prompt, ai_suggestion, completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
                 ON CONFLICT (user_id, date) DO UPDATE SET
                     ai_prompt = excluded.ai_prompt,
                     ai_suggestion = excluded.ai_suggestion",
                params![
                    Uuid::new_v4().to_string(),
                    user_id,
                    format_date(date),
                    ai_prompt,
                    ai_suggestion,
                    format_datetime(Utc::now()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Entries on or after `since`, most recent first.
    pub async fn recent_entries(
        &self,
        user_id: &str,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<DailyEntry>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, date, mood, reflections, ai_prompt, ai_suggestion,
                        completed, created_at
                 FROM daily_entries
                 WHERE user_id = ?1 AND date >= ?2
                 ORDER BY date DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(
                params![user_id, format_date(since), limit as i64],
                entry_from_row,
            )?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Stats and badges
    // ------------------------------------------------------------------

    /// Fetch a user's stats; zeroed defaults when no row exists yet.
    pub async fn get_stats(&self, user_id: &str) -> Result<UserStats> {
        let user_id = user_id.to_string();
        self.call(move |conn| read_stats(conn, &user_id)).await
    }

    /// Evaluate the fixed badge conditions and award anything newly
    /// earned. Idempotent: awards are conflict-ignored inserts, and
    /// already-earned ids are skipped up front.
    pub async fn evaluate_badges(&self, user_id: &str) -> Result<Vec<Badge>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let earned: HashSet<String> = {
                let mut stmt = conn.prepare("SELECT badge_id FROM badges WHERE user_id = ?1")?;
                let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<HashSet<_>>>()?
            };

            let mut awarded = Vec::new();

            if !earned.contains(crate::domain::BADGE_STREAK_7) {
                let dates: Vec<NaiveDate> = {
                    let mut stmt = conn.prepare(
                        "SELECT date FROM daily_entries
                         WHERE user_id = ?1 AND completed = 1
                         ORDER BY date DESC
                         LIMIT ?2",
                    )?;
                    let rows = stmt
                        .query_map(params![user_id, STREAK_7_DAYS as i64], |row| {
                            row.get::<_, String>(0)
                        })?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows.iter().filter_map(|value| parse_date(value)).collect()
                };

                if is_week_streak(&dates) {
                    let badge = Badge::streak_7();
                    if award_badge(conn, &user_id, &badge)? {
                        awarded.push(badge);
                    }
                }
            }

            if !earned.contains(crate::domain::BADGE_CHECKINS_30) {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM mission_completions WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )?;
                if count >= CHECKINS_30_THRESHOLD {
                    let badge = Badge::checkins_30();
                    if award_badge(conn, &user_id, &badge)? {
                        awarded.push(badge);
                    }
                }
            }

            Ok(awarded)
        })
        .await
    }

    /// List a user's earned badges, oldest first.
    pub async fn list_badges(&self, user_id: &str) -> Result<Vec<Badge>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT badge_id, name, description, earned_at
                 FROM badges WHERE user_id = ?1 ORDER BY earned_at",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Badge {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    earned_at: parse_datetime(row.get(3)?),
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Mentor notes
    // ------------------------------------------------------------------

    /// Insert a mentor note.
    pub async fn insert_mentor_note(&self, note: &MentorNote) -> Result<()> {
        let note = note.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO mentor_notes (id, user_id, note, tags, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    note.id,
                    note.user_id,
                    note.note,
                    serde_json::to_string(&note.tags)?,
                    format_datetime(note.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Most recent mentor notes.
    pub async fn recent_mentor_notes(&self, user_id: &str, limit: usize) -> Result<Vec<MentorNote>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, note, tags, created_at
                 FROM mentor_notes WHERE user_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;
            let mut notes = Vec::new();
            for item in rows {
                let (id, user_id, note, tags, created_at) = item?;
                notes.push(MentorNote {
                    id,
                    user_id,
                    note,
                    tags: serde_json::from_str(&tags).unwrap_or_default(),
                    created_at: parse_datetime(created_at),
                });
            }
            Ok(notes)
        })
        .await
    }

    /// Count mentor notes created on a calendar date (plan limiting).
    pub async fn count_mentor_notes_on(&self, user_id: &str, date: NaiveDate) -> Result<i64> {
        let user_id = user_id.to_string();
        let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = start + Days::new(1);
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM mentor_notes
                 WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3",
                params![user_id, format_datetime(start), format_datetime(end)],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Demo data (admin)
    // ------------------------------------------------------------------

    /// Replace the user's data with a deterministic demo set: 3
    /// missions, 10 days of completed entries, 20 check-ins.
    pub async fn seed_demo_data(&self, user_id: &str, today: NaiveDate) -> Result<SeedSummary> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            delete_user_rows(&tx, &user_id)?;

            let now = format_datetime(Utc::now());
            let missions = [
                ("Morning Meditation", "Mind", "daily", 7, 150, 2, "Build a consistent mindfulness practice"),
                ("Exercise Routine", "Body", "weekly", 3, 80, 1, "Stay physically active and healthy"),
                ("Creative Writing", "Craft", "weekly", 5, 220, 3, "Develop writing skills and express creativity"),
            ];
            let mut mission_ids = Vec::new();
            for (title, mission_type, cadence, target, xp, level, intent) in missions {
                let id = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO missions
                         (id, user_id, title, mission_type, intent, cadence, target_per_week,
                          xp, level, reward_xp, reward_coins, active, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12)",
                    params![id, user_id, title, mission_type, intent, cadence, target, xp, level, 50, 10, now],
                )?;
                mission_ids.push(id);
            }

            let moods = [3, 4, 5, 3, 4, 2, 4, 5, 3, 4];
            let reflections = [
                "Had a productive day today. Feeling motivated.",
                "Struggled a bit with focus but pushed through.",
                "Great day! Everything clicked into place.",
                "Feeling a bit overwhelmed but staying positive.",
                "Made good progress on my goals today.",
                "Had some challenges but learned from them.",
                "Feeling energized and ready for more.",
                "A calm and peaceful day overall.",
                "Busy day but managed to stay on track.",
                "Ending the day with gratitude.",
            ];
            for (i, (mood, reflection)) in moods.iter().zip(reflections.iter()).enumerate() {
                let date = today - Days::new(i as u64);
                tx.execute(
                    "INSERT INTO daily_entries
                         (id, user_id, date, mood, reflections, ai_prompt, ai_suggestion,
                          completed, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
                    params![
                        Uuid::new_v4().to_string(),
                        user_id,
                        format_date(date),
                        mood,
                        reflection,
                        "What small win can you celebrate from today?",
                        "Take 5 minutes to journal about your progress",
                        now,
                    ],
                )?;
            }

            for i in 0..20usize {
                let mission_id = &mission_ids[i % mission_ids.len()];
                let occurred = today - Days::new((i / mission_ids.len()) as u64);
                let occurred_at = occurred.and_hms_opt(12, 0, 0).unwrap().and_utc();
                tx.execute(
                    "INSERT INTO checkins (id, mission_id, user_id, xp_awarded, occurred_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        Uuid::new_v4().to_string(),
                        mission_id,
                        user_id,
                        CHECKIN_XP,
                        format_datetime(occurred_at),
                    ],
                )?;
            }

            tx.commit()?;
            Ok(SeedSummary {
                missions: 3,
                entries: 10,
                checkins: 20,
            })
        })
        .await
    }

    /// Delete every row the user owns.
    pub async fn reset_user_data(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            delete_user_rows(&tx, &user_id)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

// ----------------------------------------------------------------------
// Row mapping and shared helpers
// ----------------------------------------------------------------------

fn mission_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mission> {
    Ok(Mission {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        mission_type: MissionType::parse(&row.get::<_, String>(3)?)
            .unwrap_or(MissionType::Custom),
        intent: row.get(4)?,
        cadence: Cadence::parse(&row.get::<_, String>(5)?).unwrap_or(Cadence::Daily),
        target_per_week: row.get(6)?,
        xp: row.get(7)?,
        level: row.get(8)?,
        reward_xp: row.get(9)?,
        reward_coins: row.get(10)?,
        active: row.get(11)?,
        created_at: parse_datetime(row.get(12)?),
    })
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyEntry> {
    Ok(DailyEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(&row.get::<_, String>(2)?).unwrap_or_default(),
        mood: row.get(3)?,
        reflections: row.get(4)?,
        ai_prompt: row.get(5)?,
        ai_suggestion: row.get(6)?,
        completed: row.get(7)?,
        created_at: parse_datetime(row.get(8)?),
    })
}

/// Read a stats row, zeroed defaults when absent. Works on a plain
/// connection or inside a transaction.
fn read_stats(conn: &Connection, user_id: &str) -> Result<UserStats> {
    let stats = conn
        .query_row(
            "SELECT xp_total, coins_total, daily_streak, last_daily_date,
                    freeze_tokens, last_freeze_date
             FROM user_stats WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserStats {
                    user_id: user_id.to_string(),
                    xp_total: row.get(0)?,
                    coins_total: row.get(1)?,
                    daily_streak: row.get(2)?,
                    last_daily_date: row
                        .get::<_, Option<String>>(3)?
                        .as_deref()
                        .and_then(parse_date),
                    freeze_tokens: row.get(4)?,
                    last_freeze_date: row
                        .get::<_, Option<String>>(5)?
                        .as_deref()
                        .and_then(parse_date),
                })
            },
        )
        .optional()?;
    Ok(stats.unwrap_or_else(|| UserStats::empty(user_id)))
}

/// Write a stats row (insert or replace).
fn write_stats(conn: &Connection, stats: &UserStats) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO user_stats
             (user_id, xp_total, coins_total, daily_streak, last_daily_date,
              freeze_tokens, last_freeze_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            stats.user_id,
            stats.xp_total,
            stats.coins_total,
            stats.daily_streak,
            stats.last_daily_date.map(format_date),
            stats.freeze_tokens,
            stats.last_freeze_date.map(format_date),
        ],
    )?;
    Ok(())
}

/// Insert a badge, ignoring a duplicate. Returns whether the row was
/// actually inserted.
fn award_badge(conn: &Connection, user_id: &str, badge: &Badge) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO badges (user_id, badge_id, name, description, earned_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            badge.id,
            badge.name,
            badge.description,
            format_datetime(badge.earned_at),
        ],
    )?;
    Ok(changed > 0)
}

fn delete_user_rows(conn: &Connection, user_id: &str) -> Result<()> {
    for table in [
        "checkins",
        "mission_completions",
        "mission_instances",
        "mentor_notes",
        "daily_entries",
        "missions",
        "badges",
        "user_stats",
    ] {
        conn.execute(
            &format!("DELETE FROM {table} WHERE user_id = ?1"),
            params![user_id],
        )?;
    }
    Ok(())
}

fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn parse_datetime(value: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
