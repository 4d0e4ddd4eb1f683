mod common;

use axum::http::StatusCode;
use common::{PASSWORD, setup_test_app, unique_email};
use serde_json::json;

#[tokio::test]
async fn test_register_student_creates_profile() {
    let app = setup_test_app().await;
    let email = unique_email();

    let data = app.register("student", &email, None).await;
    assert_eq!(data["user"]["role"], "student");
    assert_eq!(data["user"]["email"], email);
    assert!(data["user"].get("password").is_none());
    assert!(data["token"].is_string());
    assert!(data["refresh_token"].is_string());

    let user_id = data["user"]["id"].as_str().unwrap();
    let token = data["token"].as_str().unwrap();
    let (status, body) = app
        .get(&format!("/api/students/user/{}", user_id), Some(token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let student = &body["data"];
    assert!(student["student_id"].as_str().unwrap().starts_with("STU"));
    assert_eq!(student["current_semester"], 1);
    assert_eq!(student["is_outstanding"], false);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = setup_test_app().await;
    let email = unique_email();
    app.register("student", &email, None).await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Someone Else",
                "email": email.to_uppercase(),
                "password": PASSWORD,
                "role": "student"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = setup_test_app().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Short Pass",
                "email": unique_email(),
                "password": "123",
                "role": "student"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_requires_active_branch() {
    let app = common::setup_with_rate_limit(collegium_config::RateLimitConfig::disabled());

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "No Branch",
                "email": unique_email(),
                "password": PASSWORD,
                "role": "student"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No active branch available");
}

#[tokio::test]
async fn test_login_errors_do_not_reveal_accounts() {
    let app = setup_test_app().await;
    let email = unique_email();
    app.register("faculty", &email, None).await;

    let (unknown_status, unknown_body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": unique_email(), "password": PASSWORD }),
        )
        .await;
    let (wrong_status, wrong_body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "not-the-password" }),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_success_reports_branch() {
    let app = setup_test_app().await;
    let email = unique_email();
    app.register("student", &email, None).await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"]["branch_id"].is_string());
}

#[tokio::test]
async fn test_inactive_account_cannot_login() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let email = unique_email();
    let data = app.register("student", &email, None).await;
    let user_id = data["user"]["id"].as_str().unwrap();

    let (status, _) = app
        .patch(
            &format!("/api/users/{}/status", user_id),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Account is inactive");
}

#[tokio::test]
async fn test_second_admin_requires_admin_caller() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Sneaky Admin",
                "email": unique_email(),
                "password": PASSWORD,
                "role": "admin"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only administrators can create admin accounts");

    let data = app.register("admin", &unique_email(), Some(&admin)).await;
    assert_eq!(data["user"]["role"], "admin");
}

#[tokio::test]
async fn test_me_composes_admin_profile() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app.get("/api/auth/me", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let profile = &body["data"];
    assert_eq!(profile["role"], "admin");
    assert!(profile.get("password_hash").is_none());
    assert!(profile["admin_details"]["admin_id"].as_str().unwrap().starts_with("ADM"));
    assert!(profile["student_details"].is_null());
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = setup_test_app().await;

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let app = setup_test_app().await;
    let data = app.register("student", &unique_email(), None).await;

    let (status, body) = app
        .post(
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": data["refresh_token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, _) = app
        .post(
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": data["token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = setup_test_app().await;
    let email = unique_email();
    let data = app.register("student", &email, None).await;
    let token = data["token"].as_str().unwrap();

    let (status, body) = app
        .put(
            "/api/auth/change-password",
            Some(token),
            json!({ "current_password": "wrong-one", "new_password": "newsecret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = app
        .put(
            "/api/auth/change-password",
            Some(token),
            json!({ "current_password": PASSWORD, "new_password": "newsecret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "newsecret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_student_cannot_reach_admin_routes() {
    let app = setup_test_app().await;
    let (user_id, token) = app.user_token("student").await;

    let (status, _) = app
        .get(&format!("/api/users/{}/profile", user_id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
