//! Database schema definitions.

/// SQLite schema for Horizon.
///
/// The `mission_instances` uniqueness constraint on
/// (mission_id, user_id, period_id) is what makes the instance roller
/// race-free: concurrent rolls for the same period conflict at the
/// storage layer and are ignored. Likewise `badges` is keyed on
/// (user_id, badge_id) so awards are idempotent inserts, never a
/// read-modify-write of a list.
pub const SQLITE_SCHEMA: &str = r"
-- Missions table
CREATE TABLE IF NOT EXISTS missions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    mission_type TEXT NOT NULL,
    intent TEXT,
    cadence TEXT NOT NULL,
    target_per_week INTEGER NOT NULL DEFAULT 7,
    xp INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    reward_xp INTEGER NOT NULL DEFAULT 50,
    reward_coins INTEGER NOT NULL DEFAULT 10,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_missions_user ON missions(user_id, active);
CREATE INDEX IF NOT EXISTS idx_missions_user_cadence ON missions(user_id, cadence, active);

-- Mission instances table
CREATE TABLE IF NOT EXISTS mission_instances (
    id TEXT PRIMARY KEY,
    mission_id TEXT NOT NULL REFERENCES missions(id),
    user_id TEXT NOT NULL,
    period_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'available',
    created_at TEXT NOT NULL,
    completed_at TEXT,
    claimed_at TEXT,
    UNIQUE (mission_id, user_id, period_id)
);
CREATE INDEX IF NOT EXISTS idx_instances_user_period ON mission_instances(user_id, period_id);

-- Mission completions table (append-only claim log)
CREATE TABLE IF NOT EXISTS mission_completions (
    id TEXT PRIMARY KEY,
    mission_instance_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    xp_awarded INTEGER NOT NULL,
    coins_awarded INTEGER NOT NULL,
    occurred_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_completions_user ON mission_completions(user_id);

-- Check-ins table (append-only quick-win log)
CREATE TABLE IF NOT EXISTS checkins (
    id TEXT PRIMARY KEY,
    mission_id TEXT NOT NULL REFERENCES missions(id),
    user_id TEXT NOT NULL,
    entry_id TEXT,
    note TEXT,
    xp_awarded INTEGER NOT NULL DEFAULT 10,
    occurred_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_checkins_user_time ON checkins(user_id, occurred_at DESC);

-- Daily entries table
CREATE TABLE IF NOT EXISTS daily_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    mood INTEGER,
    reflections TEXT,
    ai_prompt TEXT,
    ai_suggestion TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, date)
);

-- User stats table
CREATE TABLE IF NOT EXISTS user_stats (
    user_id TEXT PRIMARY KEY,
    xp_total INTEGER NOT NULL DEFAULT 0,
    coins_total INTEGER NOT NULL DEFAULT 0,
    daily_streak INTEGER NOT NULL DEFAULT 0,
    last_daily_date TEXT,
    freeze_tokens INTEGER NOT NULL DEFAULT 0,
    last_freeze_date TEXT
);

-- Badges table (idempotent awards)
CREATE TABLE IF NOT EXISTS badges (
    user_id TEXT NOT NULL,
    badge_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    earned_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

-- Profiles table
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    display_name TEXT,
    timezone TEXT,
    subscription_plan TEXT NOT NULL DEFAULT 'free',
    created_at TEXT NOT NULL
);

-- Mentor notes table
CREATE TABLE IF NOT EXISTS mentor_notes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    note TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_mentor_notes_user_time ON mentor_notes(user_id, created_at DESC);

-- User roles table (admin gating)
CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL,
    role TEXT NOT NULL,
    PRIMARY KEY (user_id, role)
);
";
