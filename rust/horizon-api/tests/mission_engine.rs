//! Integration tests for the mission reward engine over the store.
//!
//! Exercises the roller, the completion/claim state machine, the
//! streak updater, and the badge evaluator against an in-memory
//! database.

use chrono::{Days, NaiveDate};

use horizon_api::database::{ClaimOutcome, CheckinOutcome, CompleteOutcome, SqliteStore};
use horizon_api::domain::mission::{Cadence, Mission, MissionType};
use horizon_api::domain::{period_key, InstanceStatus, BADGE_CHECKINS_30, BADGE_STREAK_7};

const USER: &str = "user-1";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn store() -> SqliteStore {
    let store = SqliteStore::in_memory();
    store.init().await.unwrap();
    store
}

async fn daily_mission(store: &SqliteStore, title: &str, xp: i64, coins: i64) -> Mission {
    let mut mission = Mission::new(USER, title, MissionType::Mind, Cadence::Daily);
    mission.reward_xp = xp;
    mission.reward_coins = coins;
    store.create_mission(&mission).await.unwrap();
    mission
}

/// Roll an instance for a period and walk it to `completed`.
async fn completed_instance(store: &SqliteStore, period: &str) -> String {
    store
        .roll_instances(USER, Cadence::Daily, period)
        .await
        .unwrap();
    let instances = store.list_instances(USER, period).await.unwrap();
    let id = instances
        .iter()
        .find(|i| i.status == InstanceStatus::Available)
        .expect("an available instance")
        .id
        .clone();
    let outcome = store.complete_instance(USER, &id).await.unwrap();
    assert_eq!(outcome, CompleteOutcome::Completed);
    id
}

#[tokio::test]
async fn rolling_twice_creates_no_duplicates() {
    let store = store().await;
    daily_mission(&store, "Meditate", 50, 10).await;
    daily_mission(&store, "Journal", 50, 10).await;

    let period = period_key(Cadence::Daily, date(2025, 6, 10));
    let first = store
        .roll_instances(USER, Cadence::Daily, &period)
        .await
        .unwrap();
    let second = store
        .roll_instances(USER, Cadence::Daily, &period)
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(store.list_instances(USER, &period).await.unwrap().len(), 2);
}

#[tokio::test]
async fn roller_caps_instances_per_period() {
    let store = store().await;
    for i in 0..7 {
        daily_mission(&store, &format!("Mission {i}"), 50, 10).await;
    }

    let period = period_key(Cadence::Daily, date(2025, 6, 10));
    let created = store
        .roll_instances(USER, Cadence::Daily, &period)
        .await
        .unwrap();

    assert_eq!(created, 5);
    assert_eq!(store.list_instances(USER, &period).await.unwrap().len(), 5);
}

#[tokio::test]
async fn roller_ignores_other_users_and_cadences() {
    let store = store().await;
    daily_mission(&store, "Mine", 50, 10).await;
    let mut weekly = Mission::new(USER, "Weekly", MissionType::Body, Cadence::Weekly);
    weekly.reward_xp = 10;
    store.create_mission(&weekly).await.unwrap();
    let other = Mission::new("user-2", "Theirs", MissionType::Mind, Cadence::Daily);
    store.create_mission(&other).await.unwrap();

    let period = period_key(Cadence::Daily, date(2025, 6, 10));
    let created = store
        .roll_instances(USER, Cadence::Daily, &period)
        .await
        .unwrap();

    assert_eq!(created, 1);
}

#[tokio::test]
async fn claiming_a_non_completed_instance_is_rejected() {
    let store = store().await;
    daily_mission(&store, "Meditate", 100, 20).await;

    let period = period_key(Cadence::Daily, date(2025, 6, 10));
    store
        .roll_instances(USER, Cadence::Daily, &period)
        .await
        .unwrap();
    let id = store.list_instances(USER, &period).await.unwrap()[0].id.clone();

    let outcome = store
        .claim_instance(USER, &id, date(2025, 6, 10))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ClaimOutcome::WrongState(InstanceStatus::Available)
    ));

    // Nothing was awarded.
    let stats = store.get_stats(USER).await.unwrap();
    assert_eq!(stats.xp_total, 0);
    assert_eq!(stats.coins_total, 0);
    assert!(store.list_badges(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn claim_awards_exactly_once() {
    let store = store().await;
    daily_mission(&store, "Meditate", 100, 20).await;

    let today = date(2025, 6, 10);
    let period = period_key(Cadence::Daily, today);
    let id = completed_instance(&store, &period).await;

    let outcome = store.claim_instance(USER, &id, today).await.unwrap();
    let ClaimOutcome::Claimed(summary) = outcome else {
        panic!("expected a successful claim");
    };
    assert_eq!(summary.xp_awarded, 100);
    assert_eq!(summary.coins_awarded, 20);
    assert_eq!(summary.stats.xp_total, 100);
    assert_eq!(summary.stats.coins_total, 20);
    assert_eq!(summary.stats.daily_streak, 1);

    // A second claim loses the status check.
    let again = store.claim_instance(USER, &id, today).await.unwrap();
    assert!(matches!(
        again,
        ClaimOutcome::WrongState(InstanceStatus::Claimed)
    ));

    // Totals did not move.
    let stats = store.get_stats(USER).await.unwrap();
    assert_eq!(stats.xp_total, 100);
    assert_eq!(stats.coins_total, 20);
}

#[tokio::test]
async fn completing_twice_is_idempotent_and_claimed_is_terminal() {
    let store = store().await;
    daily_mission(&store, "Meditate", 100, 20).await;

    let today = date(2025, 6, 10);
    let period = period_key(Cadence::Daily, today);
    let id = completed_instance(&store, &period).await;

    assert_eq!(
        store.complete_instance(USER, &id).await.unwrap(),
        CompleteOutcome::AlreadyCompleted
    );

    store.claim_instance(USER, &id, today).await.unwrap();
    assert_eq!(
        store.complete_instance(USER, &id).await.unwrap(),
        CompleteOutcome::AlreadyClaimed
    );

    assert_eq!(
        store.complete_instance(USER, "missing").await.unwrap(),
        CompleteOutcome::NotFound
    );
}

#[tokio::test]
async fn daily_claims_on_consecutive_days_grow_the_streak() {
    let store = store().await;
    daily_mission(&store, "Meditate", 50, 10).await;

    for (i, day) in [date(2025, 6, 10), date(2025, 6, 11), date(2025, 6, 12)]
        .into_iter()
        .enumerate()
    {
        let period = period_key(Cadence::Daily, day);
        let id = completed_instance(&store, &period).await;
        let outcome = store.claim_instance(USER, &id, day).await.unwrap();
        let ClaimOutcome::Claimed(summary) = outcome else {
            panic!("expected a successful claim");
        };
        assert_eq!(summary.stats.daily_streak, i as i64 + 1);
    }

    // A two-day gap resets.
    let day = date(2025, 6, 15);
    let period = period_key(Cadence::Daily, day);
    let id = completed_instance(&store, &period).await;
    let ClaimOutcome::Claimed(summary) = store.claim_instance(USER, &id, day).await.unwrap()
    else {
        panic!("expected a successful claim");
    };
    assert_eq!(summary.stats.daily_streak, 1);
}

#[tokio::test]
async fn weekly_claims_do_not_touch_the_streak() {
    let store = store().await;
    let mut mission = Mission::new(USER, "Review", MissionType::Craft, Cadence::Weekly);
    mission.reward_xp = 80;
    mission.reward_coins = 5;
    store.create_mission(&mission).await.unwrap();

    let day = date(2025, 6, 10);
    let period = period_key(Cadence::Weekly, day);
    store
        .roll_instances(USER, Cadence::Weekly, &period)
        .await
        .unwrap();
    let id = store.list_instances(USER, &period).await.unwrap()[0].id.clone();
    store.complete_instance(USER, &id).await.unwrap();

    let ClaimOutcome::Claimed(summary) = store.claim_instance(USER, &id, day).await.unwrap()
    else {
        panic!("expected a successful claim");
    };
    assert_eq!(summary.stats.xp_total, 80);
    assert_eq!(summary.stats.daily_streak, 0);
}

#[tokio::test]
async fn pulse_completion_feeds_the_same_streak() {
    let store = store().await;

    store
        .upsert_entry(USER, date(2025, 6, 10), Some(4), None, true)
        .await
        .unwrap();
    store
        .upsert_entry(USER, date(2025, 6, 11), Some(3), None, true)
        .await
        .unwrap();

    let stats = store.get_stats(USER).await.unwrap();
    assert_eq!(stats.daily_streak, 2);

    // Re-saving the same day's entry does not double count.
    store
        .upsert_entry(USER, date(2025, 6, 11), Some(5), Some("better".into()), true)
        .await
        .unwrap();
    assert_eq!(store.get_stats(USER).await.unwrap().daily_streak, 2);
}

#[tokio::test]
async fn seven_consecutive_entries_earn_the_week_badge_once() {
    let store = store().await;
    let today = date(2025, 6, 10);

    for i in 0..7u64 {
        store
            .upsert_entry(USER, today - Days::new(i), Some(4), None, true)
            .await
            .unwrap();
    }

    let awarded = store.evaluate_badges(USER).await.unwrap();
    assert!(awarded.iter().any(|b| b.id == BADGE_STREAK_7));

    // Second sweep awards nothing new.
    assert!(store.evaluate_badges(USER).await.unwrap().is_empty());
    let badges = store.list_badges(USER).await.unwrap();
    assert_eq!(
        badges.iter().filter(|b| b.id == BADGE_STREAK_7).count(),
        1
    );
}

#[tokio::test]
async fn a_gap_in_the_week_withholds_the_badge() {
    let store = store().await;
    let today = date(2025, 6, 10);

    // Six recent days plus one entry three days before them.
    for i in 0..6u64 {
        store
            .upsert_entry(USER, today - Days::new(i), Some(4), None, true)
            .await
            .unwrap();
    }
    store
        .upsert_entry(USER, today - Days::new(8), Some(4), None, true)
        .await
        .unwrap();

    let awarded = store.evaluate_badges(USER).await.unwrap();
    assert!(!awarded.iter().any(|b| b.id == BADGE_STREAK_7));
}

#[tokio::test]
async fn thirty_completions_earn_the_consistency_badge() {
    let store = store().await;
    daily_mission(&store, "Meditate", 10, 1).await;

    let start = date(2025, 1, 1);
    for i in 0..30u64 {
        let day = start + Days::new(i);
        let period = period_key(Cadence::Daily, day);
        let id = completed_instance(&store, &period).await;
        store.claim_instance(USER, &id, day).await.unwrap();

        let awarded = store.evaluate_badges(USER).await.unwrap();
        if i < 29 {
            assert!(
                !awarded.iter().any(|b| b.id == BADGE_CHECKINS_30),
                "badge must not appear at {} completions",
                i + 1
            );
        } else {
            assert!(awarded.iter().any(|b| b.id == BADGE_CHECKINS_30));
        }
    }
}

#[tokio::test]
async fn first_levelup_badge_is_awarded_at_level_two() {
    let store = store().await;
    let mut mission = Mission::new(USER, "Guitar", MissionType::Craft, Cadence::Daily);
    mission.xp = 90;
    store.create_mission(&mission).await.unwrap();

    let outcome = store.log_checkin(USER, &mission.id, None).await.unwrap();
    let CheckinOutcome::Logged(summary) = outcome else {
        panic!("expected a logged check-in");
    };

    assert_eq!(summary.mission_xp, 100);
    assert_eq!(summary.level, 2);
    assert!(summary.leveled_up);
    let badge = summary.badge.expect("level-up badge");
    assert_eq!(badge.id, format!("first-levelup-{}", mission.id));

    // Later level-ups do not mint further badges.
    let fresh = store.log_checkin(USER, &mission.id, None).await.unwrap();
    let CheckinOutcome::Logged(summary) = fresh else {
        panic!("expected a logged check-in");
    };
    assert!(summary.badge.is_none());
}

#[tokio::test]
async fn checkin_against_a_missing_mission_is_rejected() {
    let store = store().await;
    let outcome = store.log_checkin(USER, "nope", None).await.unwrap();
    assert!(matches!(outcome, CheckinOutcome::MissionNotFound));
}

#[tokio::test]
async fn seed_then_reset_leaves_no_rows() {
    let store = store().await;
    let today = date(2025, 6, 10);

    let summary = store.seed_demo_data(USER, today).await.unwrap();
    assert_eq!(summary.missions, 3);
    assert_eq!(summary.entries, 10);
    assert_eq!(summary.checkins, 20);

    assert_eq!(store.list_missions(USER, true).await.unwrap().len(), 3);
    assert_eq!(
        store
            .recent_entries(USER, today - Days::new(30), 30)
            .await
            .unwrap()
            .len(),
        10
    );

    store.reset_user_data(USER).await.unwrap();
    assert!(store.list_missions(USER, false).await.unwrap().is_empty());
    assert!(store
        .recent_entries(USER, today - Days::new(30), 30)
        .await
        .unwrap()
        .is_empty());
    let stats = store.get_stats(USER).await.unwrap();
    assert_eq!(stats.xp_total, 0);
}

#[tokio::test]
async fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let store = SqliteStore::new(dir.path().to_path_buf());
    store.init().await.unwrap();
    daily_mission(&store, "Persist", 10, 1).await;
    drop(store);

    let reopened = SqliteStore::new(dir.path().to_path_buf());
    reopened.init().await.unwrap();
    let missions = reopened.list_missions(USER, true).await.unwrap();
    assert_eq!(missions.len(), 1);
    assert_eq!(missions[0].title, "Persist");
}

#[tokio::test]
async fn top_mission_reflects_the_trailing_week() {
    let store = store().await;
    let a = daily_mission(&store, "Stretch", 10, 1).await;
    let b = daily_mission(&store, "Read", 10, 1).await;

    for _ in 0..3 {
        store.log_checkin(USER, &a.id, None).await.unwrap();
    }
    store.log_checkin(USER, &b.id, None).await.unwrap();

    let since = chrono::Utc::now() - Days::new(7);
    let (title, count) = store.top_mission_since(USER, since).await.unwrap().unwrap();
    assert_eq!(title, "Stretch");
    assert_eq!(count, 3);
}
