mod common;

use axum::http::StatusCode;
use common::TestApp;

const DATE: &str = "2025-06-02";
const TIME: &str = "10:00";
const KEY_URI: &str = "/api/v1/slots/2025-06-02/10:00";

#[tokio::test]
async fn test_empty_key_offers_both_types() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, DATE, TIME, "individual", 1).await;
    app.create_slot(&admin, DATE, TIME, "group", 5).await;

    let (status, view) = app.send("GET", KEY_URI, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["time"], "10:00");
    assert_eq!(view["individual"]["available"], true);
    assert_eq!(view["individual"]["max"], 1);
    assert_eq!(view["group"]["available"], true);
    assert_eq!(view["group"]["current"], 0);
    assert_eq!(view["group"]["max"], 5);
}

#[tokio::test]
async fn test_individual_booking_closes_key_for_everyone() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, DATE, TIME, "individual", 1).await;
    app.create_slot(&admin, DATE, TIME, "group", 5).await;
    let u1 = app.register("u1@gym.test", "U1").await;
    app.book(&u1, DATE, TIME, "individual").await;

    let (_, view) = app.send("GET", KEY_URI, Some(&u1), None).await;
    assert_eq!(view["individual"]["available"], false);
    assert_eq!(view["individual"]["user_reserved"], true);
    assert_eq!(view["group"]["available"], false);
    assert_eq!(view["group"]["reason"], "exclusive");
}

#[tokio::test]
async fn test_group_bookings_keep_group_open() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, DATE, TIME, "individual", 1).await;
    app.create_slot(&admin, DATE, TIME, "group", 5).await;
    for name in ["u1", "u2"] {
        let user = app.register(&format!("{}@gym.test", name), name).await;
        app.book(&user, DATE, TIME, "group").await;
    }
    let u3 = app.register("u3@gym.test", "U3").await;

    let (_, view) = app.send("GET", KEY_URI, Some(&u3), None).await;
    assert_eq!(view["individual"]["available"], false);
    assert_eq!(view["individual"]["reason"], "exclusive");
    assert_eq!(view["group"]["available"], true);
    assert_eq!(view["group"]["current"], 2);
    assert_eq!(view["group"]["user_reserved"], false);
}

#[tokio::test]
async fn test_listing_groups_by_key_and_marks_reservations() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, DATE, TIME, "individual", 1).await;
    app.create_slot(&admin, DATE, TIME, "group", 5).await;
    app.create_slot(&admin, DATE, "11:00", "group", 5).await;
    app.create_slot(&admin, "2025-06-20", "11:00", "group", 5).await;
    let alice = app.register("alice@gym.test", "Alice").await;
    app.book(&alice, DATE, "11:00", "group").await;

    let (status, body) = app.send("GET", "/api/v1/slots?from=2025-06-02&to=2025-06-08", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let views = body["slots"].as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["time"], "10:00");
    assert_eq!(views[1]["time"], "11:00");
    assert_eq!(views[1]["group"]["user_reserved"], true);
    assert_eq!(views[1]["individual"]["reason"], "not_offered");

    let (_, anonymous) = app.send("GET", "/api/v1/slots?from=2025-06-02&to=2025-06-08", None, None).await;
    assert_eq!(anonymous["slots"][1]["group"]["user_reserved"], false);
    assert_eq!(anonymous["slots"][1]["group"]["current"], 1);
}

#[tokio::test]
async fn test_default_window_starts_today() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.create_slot(&admin, DATE, TIME, "group", 5).await;

    let (status, body) = app.send("GET", "/api/v1/slots", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "2025-06-01");
    assert_eq!(body["to"], "2025-06-07");
    assert_eq!(body["slots"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_writes_invalidate_cached_listing() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let uri = "/api/v1/slots?from=2025-06-02&to=2025-06-08";
    app.create_slot(&admin, DATE, TIME, "group", 5).await;

    let (_, before) = app.send("GET", uri, None, None).await;
    assert_eq!(before["slots"].as_array().unwrap().len(), 1);

    let slot_id = app.create_slot(&admin, DATE, "12:00", "group", 5).await;
    let (_, after_create) = app.send("GET", uri, None, None).await;
    assert_eq!(after_create["slots"].as_array().unwrap().len(), 2);

    app.send("DELETE", &format!("/api/v1/admin/slots/{}", slot_id), Some(&admin), None).await;
    let (_, after_delete) = app.send("GET", uri, None, None).await;
    assert_eq!(after_delete["slots"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_ranges_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.send("GET", "/api/v1/slots?from=2025-06-08&to=2025-06-02", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("GET", "/api/v1/slots?from=2025-01-01&to=2025-12-31", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("GET", "/api/v1/slots/2025-06-02/25:00", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
