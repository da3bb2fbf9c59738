mod common;

use axum::http::StatusCode;
use chrono::{NaiveDate, TimeZone, Utc};
use common::TestApp;
use serde_json::{json, Value};

async fn generate(app: &TestApp, payload: Value) -> (StatusCode, Value) {
    let admin = app.admin().await;
    app.send("POST", "/api/v1/admin/slots/recurring", Some(&admin), Some(payload)).await
}

async fn all_slots(app: &TestApp) -> Vec<Value> {
    let admin = app.admin().await;
    let (status, body) = app.send("GET", "/api/v1/admin/slots?from=2025-05-01&to=2026-01-31", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().clone()
}

#[tokio::test]
async fn test_generation_counts_and_capacities() {
    let app = TestApp::new().await;

    let (status, body) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon", "thu"],
        "start_hour": 9,
        "end_hour": 12,
        "service_types": ["individual", "group"],
        "weeks": 2,
        "group_capacity": 6
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "created": 24, "skipped": 0, "failed": 0 }));

    let slots = all_slots(&app).await;
    assert_eq!(slots.len(), 24);
    assert!(slots.iter().filter(|s| s["service_type"] == "individual").all(|s| s["capacity"] == 1));
    assert!(slots.iter().filter(|s| s["service_type"] == "group").all(|s| s["capacity"] == 6));
}

#[tokio::test]
async fn test_regeneration_skips_existing_slots() {
    let app = TestApp::new().await;
    let payload = json!({
        "start_date": "2025-06-02",
        "weekdays": ["monday"],
        "start_hour": 9,
        "end_hour": 12,
        "service_types": ["group"],
        "weeks": 3
    });

    let (_, first) = generate(&app, payload.clone()).await;
    assert_eq!(first["created"], 9);

    let (status, second) = generate(&app, payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, json!({ "created": 0, "skipped": 9, "failed": 0 }));

    let slots = all_slots(&app).await;
    assert_eq!(slots.len(), 9);
    // Default group capacity from config.
    assert!(slots.iter().all(|s| s["capacity"] == 5));
}

#[tokio::test]
async fn test_partial_overlap_creates_only_missing_rows() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, "2025-06-02", "10:00", "group", 3).await;

    let (status, body) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon"],
        "start_hour": 9,
        "end_hour": 12,
        "service_types": ["group"],
        "weeks": 1
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "created": 2, "skipped": 1, "failed": 0 }));

    let slots = all_slots(&app).await;
    let existing = slots.iter().find(|s| s["time"] == "10:00:00").unwrap();
    assert_eq!(existing["capacity"], 3);
}

#[tokio::test]
async fn test_past_slots_are_skipped() {
    let app = TestApp::new().await;
    // Monday 2025-06-02 10:30 in Paris.
    app.clock.set(Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap());

    let (status, body) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon", "thu"],
        "start_hour": 9,
        "end_hour": 12,
        "service_types": ["individual", "group"],
        "weeks": 1
    })).await;

    assert_eq!(status, StatusCode::OK);
    // Monday keeps 11:00 only, Thursday keeps all three hours.
    assert_eq!(body["created"], 8);
    let slots = all_slots(&app).await;
    assert!(slots.iter().all(|s| !(s["date"] == "2025-06-02" && s["time"] != "11:00:00")));
}

#[tokio::test]
async fn test_horizon_is_capped_at_sixteen_weeks() {
    let app = TestApp::new().await;

    let (_, capped) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon"],
        "time": "18:00",
        "service_types": ["group"],
        "weeks": 52
    })).await;
    assert_eq!(capped["created"], 16);

    let (_, indefinite) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["wed"],
        "time": "18:00",
        "service_types": ["group"]
    })).await;
    assert_eq!(indefinite["created"], 16);

    let limit = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
    for slot in all_slots(&app).await {
        let date = NaiveDate::parse_from_str(slot["date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
        assert!(date < limit);
    }
}

#[tokio::test]
async fn test_large_request_goes_through_chunks() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, "2025-06-03", "10:00", "group", 4).await;

    let (status, body) = generate(&app, json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon", "tue", "wed", "thu", "fri", "sat", "sun"],
        "start_hour": 6,
        "end_hour": 22,
        "service_types": ["individual", "group"],
        "weeks": 16
    })).await;

    assert_eq!(status, StatusCode::OK);
    let total: i64 = 7 * 16 * 16 * 2;
    assert_eq!(body["created"], total - 1);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["failed"], 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM slots").fetch_one(&app.pool).await.unwrap();
    assert_eq!(count, total);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let app = TestApp::new().await;
    let base = json!({
        "start_date": "2025-06-02",
        "weekdays": ["mon"],
        "start_hour": 9,
        "end_hour": 12,
        "service_types": ["group"],
        "weeks": 1
    });

    let mut cases = Vec::new();
    let mut no_days = base.clone();
    no_days["weekdays"] = json!([]);
    cases.push(no_days);
    let mut bad_day = base.clone();
    bad_day["weekdays"] = json!(["funday"]);
    cases.push(bad_day);
    let mut reversed = base.clone();
    reversed["start_hour"] = json!(14);
    reversed["end_hour"] = json!(10);
    cases.push(reversed);
    let mut both_specs = base.clone();
    both_specs["time"] = json!("18:00");
    cases.push(both_specs);
    let mut zero_weeks = base.clone();
    zero_weeks["weeks"] = json!(0);
    cases.push(zero_weeks);
    let mut no_types = base.clone();
    no_types["service_types"] = json!([]);
    cases.push(no_types);
    let mut no_seats = base.clone();
    no_seats["group_capacity"] = json!(0);
    cases.push(no_seats);

    for payload in cases {
        let (status, _) = generate(&app, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload accepted: {}", payload);
    }
    assert!(all_slots(&app).await.is_empty());
}

#[tokio::test]
async fn test_generation_requires_admin() {
    let app = TestApp::new().await;
    let user = app.register("user@gym.test", "User").await;

    let (status, _) = app.send(
        "POST",
        "/api/v1/admin/slots/recurring",
        Some(&user),
        Some(json!({ "start_date": "2025-06-02", "weekdays": ["mon"], "time": "18:00", "service_types": ["group"] })),
    ).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_start_date_at_calendar_edge_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = generate(&app, json!({
        "start_date": "+262142-12-20",
        "weekdays": ["mon"],
        "time": "10:00",
        "service_types": ["group"],
        "weeks": 1
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected body: {}", body);
    assert!(all_slots(&app).await.is_empty());
}
