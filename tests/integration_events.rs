mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, image, setup_test_app};
use serde_json::{Value, json};

async fn create_event(app: &TestApp, admin: &str, extra: Value) -> String {
    let start = Utc::now() + Duration::days(2);
    let mut payload = json!({
        "event_name": "Tech Fest",
        "description": "Annual technical festival with talks",
        "event_type": "technical",
        "start_date": start,
        "end_date": start + Duration::hours(6),
        "venue": "Main Hall",
        "image": image("collegium/events/cover")
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    let (status, body) = app.post("/api/events", Some(admin), payload).await;
    assert_eq!(status, StatusCode::CREATED, "create event failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let start = Utc::now() + Duration::days(1);

    let (status, body) = app
        .post(
            "/api/events",
            Some(&admin),
            json!({
                "event_name": "Backwards",
                "description": "An event that ends before it starts",
                "event_type": "seminar",
                "start_date": start,
                "end_date": start - Duration::hours(1),
                "venue": "Room 1",
                "image": image("collegium/events/x")
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_twice_is_rejected() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = create_event(&app, &admin, json!({})).await;
    let (_, student) = app.user_token("student").await;
    let uri = format!("/api/events/{}/register", id);

    let (status, body) = app.post(&uri, Some(&student), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["participant_count"], 1);

    let (status, body) = app.post(&uri, Some(&student), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already registered for this event");

    let (_, body) = app
        .get(&format!("/api/events/{}/registration", id), Some(&student))
        .await;
    assert_eq!(body["data"]["is_registered"], true);
    assert_eq!(body["data"]["participant_count"], 1);
}

#[tokio::test]
async fn test_ended_event_refuses_registration() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let start = Utc::now() - Duration::days(3);
    let id = create_event(
        &app,
        &admin,
        json!({ "start_date": start, "end_date": start + Duration::hours(2) }),
    )
    .await;
    let (_, student) = app.user_token("student").await;

    let (status, body) = app
        .post(&format!("/api/events/{}/register", id), Some(&student), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Event has already ended");
}

#[tokio::test]
async fn test_full_event_refuses_registration() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = create_event(&app, &admin, json!({ "max_participants": 1 })).await;
    let (_, first) = app.user_token("student").await;
    let (_, second) = app.user_token("faculty").await;
    let uri = format!("/api/events/{}/register", id);

    let (status, _) = app.post(&uri, Some(&first), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post(&uri, Some(&second), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Event is full");

    let (_, body) = app
        .get(&format!("/api/events/{}/registration", id), Some(&second))
        .await;
    assert_eq!(body["data"]["is_registered"], false);
    assert_eq!(body["data"]["spots_left"], 0);
}

#[tokio::test]
async fn test_unregister_requires_registration() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = create_event(&app, &admin, json!({})).await;
    let (_, student) = app.user_token("student").await;
    let uri = format!("/api/events/{}/unregister", id);

    let (status, body) = app.post(&uri, Some(&student), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Not registered for this event");

    app.post(&format!("/api/events/{}/register", id), Some(&student), json!({}))
        .await;
    let (status, body) = app.post(&uri, Some(&student), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["participant_count"], 0);
}

#[tokio::test]
async fn test_registration_requires_login() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = create_event(&app, &admin, json!({})).await;

    let (status, _) = app
        .post(&format!("/api/events/{}/register", id), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upcoming_and_past_partition() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let upcoming = create_event(&app, &admin, json!({ "event_name": "Coming Soon" })).await;
    let start = Utc::now() - Duration::days(10);
    let past = create_event(
        &app,
        &admin,
        json!({ "event_name": "Long Gone", "start_date": start, "end_date": start + Duration::hours(1) }),
    )
    .await;

    let ids = |body: &Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["id"].as_str().map(str::to_string))
            .collect()
    };

    let (status, body) = app.get("/api/events/upcoming", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![upcoming.clone()]);

    let (status, body) = app.get("/api/events/past", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![past]);
}

#[tokio::test]
async fn test_delete_event_removes_every_image() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = create_event(&app, &admin, json!({})).await;

    let (status, _) = app
        .post(
            &format!("/api/events/{}/images", id),
            Some(&admin),
            json!({ "image": image("collegium/events/g1"), "caption": "Opening talk" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.storage.set_fail_deletes(true);
    let (status, _) = app.delete(&format!("/api/events/{}", id), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.repos.pending_image_deletions.count().await.unwrap(), 2);

    let attempts = app.storage.delete_attempts();
    assert!(attempts.contains(&"collegium/events/cover".to_string()));
    assert!(attempts.contains(&"collegium/events/g1".to_string()));
}
