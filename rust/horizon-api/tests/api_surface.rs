//! Router-level tests: auth, the HTTP mission flow, validation, the
//! mentor tool loop, and admin gating, with a scripted stub standing in
//! for the AI gateway.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Local;
use serde_json::{json, Value};
use tower::ServiceExt;

use horizon_api::auth::issue_token;
use horizon_api::config::AppConfig;
use horizon_api::database::SqliteStore;
use horizon_api::domain::{Profile, SubscriptionPlan};
use horizon_api::mentor::{ChatReply, ChatRequest, GatewayError, MentorGateway, ToolCall};
use horizon_api::server::build_router;
use horizon_api::AppState;

const SECRET: &str = "test-secret";
const USER: &str = "user-1";

/// Gateway stub that replays scripted replies in order.
#[derive(Default)]
struct StubGateway {
    replies: Mutex<VecDeque<ChatReply>>,
}

impl StubGateway {
    fn push_content(&self, text: &str) {
        self.replies.lock().unwrap().push_back(ChatReply {
            message: json!({ "role": "assistant", "content": text }),
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
        });
    }

    fn push_tool_call(&self, name: &str, arguments: Value) {
        let call = ToolCall {
            id: format!("call-{name}"),
            name: name.to_string(),
            arguments: arguments.clone(),
        };
        self.replies.lock().unwrap().push_back(ChatReply {
            message: json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": call.id,
                    "type": "function",
                    "function": { "name": name, "arguments": arguments.to_string() }
                }]
            }),
            content: None,
            tool_calls: vec![call],
        });
    }
}

#[async_trait]
impl MentorGateway for StubGateway {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatReply, GatewayError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::InvalidResponse("no scripted reply".to_string()))
    }
}

struct TestApp {
    app: Router,
    store: SqliteStore,
    gateway: Arc<StubGateway>,
}

async fn test_app() -> TestApp {
    test_app_with(AppConfig {
        auth: horizon_api::config::AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
        },
        ..AppConfig::default()
    })
    .await
}

async fn test_app_with(config: AppConfig) -> TestApp {
    let store = SqliteStore::in_memory();
    store.init().await.unwrap();
    let gateway = Arc::new(StubGateway::default());
    let state = AppState {
        config: Arc::new(config),
        store: store.clone(),
        mentor: gateway.clone(),
    };
    TestApp {
        app: build_router(state),
        store,
        gateway,
    }
}

fn bearer(user: &str) -> String {
    format!("Bearer {}", issue_token(user, Vec::new(), SECRET, 3600).unwrap())
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_needs_no_token() {
    let t = test_app().await;
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let t = test_app().await;

    let (status, _) = send(&t.app, "GET", "/api/v1/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &t.app,
        "GET",
        "/api/v1/stats",
        Some("Bearer not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&t.app, "GET", "/api/v1/stats", Some(&bearer(USER)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["xp_total"], 0);
}

#[tokio::test]
async fn free_plan_caps_active_missions_at_three() {
    let t = test_app().await;
    let token = bearer(USER);

    for i in 0..3 {
        let (status, _) = send(
            &t.app,
            "POST",
            "/api/v1/missions",
            Some(&token),
            Some(json!({ "title": format!("Mission {i}"), "type": "Mind", "cadence": "daily" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/missions",
        Some(&token),
        Some(json!({ "title": "One too many", "type": "Body", "cadence": "daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("plan"));

    // Premium lifts the cap.
    let mut profile = Profile::new(USER);
    profile.subscription_plan = SubscriptionPlan::Premium;
    t.store.upsert_profile(&profile).await.unwrap();

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/missions",
        Some(&token),
        Some(json!({ "title": "Fourth", "type": "Body", "cadence": "daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mission_lifecycle_over_http() {
    let t = test_app().await;
    let token = bearer(USER);

    let (status, mission) = send(
        &t.app,
        "POST",
        "/api/v1/missions",
        Some(&token),
        Some(json!({
            "title": "Meditate",
            "type": "Mind",
            "cadence": "daily",
            "reward_xp": 100,
            "reward_coins": 20
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mission["reward_xp"], 100);

    let (status, roll) = send(
        &t.app,
        "POST",
        "/api/v1/missions/roll",
        Some(&token),
        Some(json!({ "cadence": "daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roll["created"], 1);

    let (status, instances) = send(
        &t.app,
        "GET",
        "/api/v1/instances?cadence=daily",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let instance_id = instances[0]["id"].as_str().unwrap().to_string();
    assert_eq!(instances[0]["status"], "available");

    // Claiming before completion is a state conflict.
    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/api/v1/instances/{instance_id}/claim"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Mission not completed yet");

    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/api/v1/instances/{instance_id}/complete"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, claim) = send(
        &t.app,
        "POST",
        &format!("/api/v1/instances/{instance_id}/claim"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["xp_awarded"], 100);
    assert_eq!(claim["coins_awarded"], 20);
    assert_eq!(claim["stats"]["xp_total"], 100);
    assert_eq!(claim["stats"]["daily_streak"], 1);

    // Second claim fails.
    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/api/v1/instances/{instance_id}/claim"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Unknown instance is 404.
    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/instances/unknown/complete",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pulse_upsert_validates_and_completes() {
    let t = test_app().await;
    let token = bearer(USER);

    let (status, _) = send(
        &t.app,
        "PUT",
        "/api/v1/pulse/2025-06-10",
        Some(&token),
        Some(json!({ "mood": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.app,
        "PUT",
        "/api/v1/pulse/2025-06-10",
        Some(&token),
        Some(json!({ "mood": 4, "reflections": "Solid day", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert_eq!(body["mood"], 4);

    let (status, entry) = send(&t.app, "GET", "/api/v1/pulse/2025-06-10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["reflections"], "Solid day");

    let (status, _) = send(&t.app, "GET", "/api/v1/pulse/2025-06-11", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &t.app,
        "PUT",
        "/api/v1/pulse/not-a-date",
        Some(&token),
        Some(json!({ "mood": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pulse_generation_persists_the_ai_fields() {
    let t = test_app().await;
    let token = bearer(USER);

    t.gateway.push_tool_call(
        "generate_daily_pulse",
        json!({
            "ai_prompt": "What small win can you celebrate from today?",
            "ai_suggestion": "Take 5 minutes to journal about your progress"
        }),
    );

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/pulse/generate",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["ai_prompt"].as_str().unwrap().contains("small win"));

    let today = Local::now().date_naive();
    let (status, entry) = send(
        &t.app,
        "GET",
        &format!("/api/v1/pulse/{today}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(entry["ai_suggestion"].as_str().unwrap().contains("journal"));
}

#[tokio::test]
async fn gateway_failures_surface_as_bad_gateway() {
    let t = test_app().await;
    let token = bearer(USER);

    // Empty stub queue: the gateway reports an invalid response.
    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/pulse/generate",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn mentor_chat_runs_the_tool_loop_server_side() {
    let t = test_app().await;
    let token = bearer(USER);

    t.gateway.push_tool_call(
        "save_mentor_note",
        json!({ "text": "Wants to run a 10k in October", "tags": ["goal"] }),
    );
    t.gateway
        .push_content("Noted. Lace up for a 20-minute run today.");

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/mentor/chat",
        Some(&token),
        Some(json!({ "messages": [{ "role": "user", "content": "I want to get into running" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("20-minute run"));

    let (status, notes) = send(&t.app, "GET", "/api/v1/mentor/notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes.as_array().unwrap().len(), 1);
    assert!(notes[0]["note"].as_str().unwrap().contains("10k"));
    assert_eq!(notes[0]["tags"][0], "goal");
}

#[tokio::test]
async fn mentor_chat_screens_unsafe_content() {
    let t = test_app().await;
    let token = bearer(USER);

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/mentor/chat",
        Some(&token),
        Some(json!({ "messages": [{ "role": "user", "content": "I feel hopeless and want to die" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["resources"].is_array());
}

#[tokio::test]
async fn propose_missions_parses_the_tool_reply() {
    let t = test_app().await;
    let token = bearer(USER);

    t.gateway.push_tool_call(
        "propose_missions",
        json!({
            "missions": [
                { "title": "Evening walk", "type": "Body", "cadence": "daily", "target_per_week": 5, "intent": "Move every day" },
                { "title": "Read fiction", "type": "Mind", "cadence": "daily", "target_per_week": 4, "intent": "Wind down without screens" },
                { "title": "Call a friend", "type": "Relationships", "cadence": "weekly", "target_per_week": 1, "intent": "Stay connected" }
            ]
        }),
    );

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/missions/propose",
        Some(&token),
        Some(json!({
            "focus_areas": ["Body", "Mind"],
            "why_now": "New year, new energy",
            "minutes_per_day": 20,
            "days_per_week": ["Mon", "Wed", "Fri"],
            "coach_tone": "gentle"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let missions = body["missions"].as_array().unwrap();
    assert_eq!(missions.len(), 3);
    assert_eq!(missions[0]["type"], "Body");
    assert_eq!(missions[2]["cadence"], "weekly");
}

#[tokio::test]
async fn profile_is_created_on_first_update() {
    let t = test_app().await;
    let token = bearer(USER);

    let (status, profile) = send(&t.app, "GET", "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["subscription_plan"], "free");
    assert!(profile["display_name"].is_null());

    let (status, profile) = send(
        &t.app,
        "PUT",
        "/api/v1/profile",
        Some(&token),
        Some(json!({ "display_name": "Ada", "timezone": "Europe/London" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["display_name"], "Ada");

    let (_, fetched) = send(&t.app, "GET", "/api/v1/profile", Some(&token), None).await;
    assert_eq!(fetched["timezone"], "Europe/London");
}

#[tokio::test]
async fn admin_endpoints_are_role_gated() {
    let t = test_app().await;
    let token = bearer(USER);

    let (status, _) = send(&t.app, "POST", "/api/v1/admin/seed", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.store.grant_role(USER, "admin").await.unwrap();

    let (status, body) = send(&t.app, "POST", "/api/v1/admin/seed", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["missions"], 3);

    let (status, missions) = send(&t.app, "GET", "/api/v1/missions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missions.as_array().unwrap().len(), 3);

    let (status, _) = send(&t.app, "POST", "/api/v1/admin/reset", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, stats) = send(&t.app, "GET", "/api/v1/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["xp_total"], 0);
}

#[tokio::test]
async fn admin_endpoints_are_disabled_in_production() {
    let t = test_app_with(AppConfig {
        environment: "production".to_string(),
        auth: horizon_api::config::AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
        },
        ..AppConfig::default()
    })
    .await;
    let token = bearer(USER);
    t.store.grant_role(USER, "admin").await.unwrap();

    let (status, body) = send(&t.app, "POST", "/api/v1/admin/seed", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("production"));
}

#[tokio::test]
async fn weekly_share_summarizes_the_week() {
    let t = test_app().await;
    let token = bearer(USER);

    let (_, mission) = send(
        &t.app,
        "POST",
        "/api/v1/missions",
        Some(&token),
        Some(json!({ "title": "Stretch", "type": "Body", "cadence": "daily" })),
    )
    .await;
    let mission_id = mission["id"].as_str().unwrap().to_string();

    for _ in 0..3 {
        let (status, _) = send(
            &t.app,
            "POST",
            &format!("/api/v1/missions/{mission_id}/checkin"),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    t.gateway.push_content("Three stretches deep - keep going!");

    let (status, body) = send(&t.app, "GET", "/api/v1/horizon/weekly", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["top_mission"], "Stretch");
    assert_eq!(body["completions"], 3);
    assert!(body["mentor_line"].as_str().unwrap().contains("keep going"));
}
