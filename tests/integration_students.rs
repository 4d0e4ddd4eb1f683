mod common;

use axum::http::StatusCode;
use common::{TestApp, setup_test_app};
use serde_json::json;

/// Registers a student and returns its student record id.
async fn student_record(app: &TestApp, admin: &str) -> String {
    let (user_id, _) = app.user_token("student").await;
    let (status, body) = app
        .get(&format!("/api/students/user/{}", user_id), Some(admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_gpa_sets_outstanding_flag() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;
    let uri = format!("/api/students/{}/gpa", id);

    let (status, body) = app.put(&uri, Some(&admin), json!({ "gpa": 8.6 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["gpa"], 8.6);
    assert_eq!(body["data"]["is_outstanding"], true);

    let (status, body) = app.put(&uri, Some(&admin), json!({ "gpa": 8.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_outstanding"], true);

    let (status, body) = app.put(&uri, Some(&admin), json!({ "gpa": 7.9 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_outstanding"], false);
}

#[tokio::test]
async fn test_gpa_out_of_range_is_rejected() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;

    let (status, body) = app
        .put(&format!("/api/students/{}/gpa", id), Some(&admin), json!({ "gpa": 11 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "GPA must be between 0 and 10");

    let (status, _) = app
        .put(&format!("/api/students/{}/gpa", id), Some(&admin), json!({ "gpa": -0.5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/students/{}", id), None).await;
    assert_eq!(body["data"]["gpa"], 0.0);
}

#[tokio::test]
async fn test_faculty_may_update_gpa_but_students_may_not() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;
    let (_, faculty) = app.user_token("faculty").await;
    let (_, student) = app.user_token("student").await;
    let uri = format!("/api/students/{}/gpa", id);

    let (status, _) = app.put(&uri, Some(&faculty), json!({ "gpa": 9.0 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.put(&uri, Some(&student), json!({ "gpa": 10.0 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_attendance_range() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;
    let uri = format!("/api/students/{}/attendance", id);

    let (status, body) = app.put(&uri, Some(&admin), json!({ "attendance": 101 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Attendance must be between 0 and 100");

    let (status, body) = app.put(&uri, Some(&admin), json!({ "attendance": 92.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attendance"], 92.5);
}

#[tokio::test]
async fn test_promotion_stops_at_final_semester() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;

    let (status, _) = app
        .put(
            &format!("/api/students/{}", id),
            Some(&admin),
            json!({ "current_semester": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/students/{}/promote", id);
    let (status, body) = app.post(&uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_semester"], 8);

    let (status, body) = app.post(&uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Student is already in the final semester");

    let (_, body) = app.get(&format!("/api/students/{}", id), None).await;
    assert_eq!(body["data"]["current_semester"], 8);
}

#[tokio::test]
async fn test_semester_listing_validates_range() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    student_record(&app, &admin).await;

    let (status, body) = app.get("/api/students/semester/1", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/students/semester/9", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_outstanding_listing_follows_gpa() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let top = student_record(&app, &admin).await;
    let other = student_record(&app, &admin).await;

    app.put(&format!("/api/students/{}/gpa", top), Some(&admin), json!({ "gpa": 9.1 }))
        .await;
    app.put(&format!("/api/students/{}/gpa", other), Some(&admin), json!({ "gpa": 6.0 }))
        .await;

    let (status, body) = app.get("/api/students/outstanding", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["id"].as_str())
        .collect();
    assert_eq!(ids, vec![top.as_str()]);
}

#[tokio::test]
async fn test_add_achievement() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let id = student_record(&app, &admin).await;

    let (status, body) = app
        .post(
            &format!("/api/students/{}/achievements", id),
            Some(&admin),
            json!({ "title": "Hackathon winner", "category": "technical" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let achievements = body["data"]["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0]["title"], "Hackathon winner");
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let app = setup_test_app().await;

    let (status, body) = app
        .get(&format!("/api/students/{}", uuid::Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Student not found");
}
