mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use collegium_config::RateLimitConfig;
use common::{setup_with_rate_limit, unique_email};
use serde_json::json;

fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        general_per_second: 60,
        general_burst_size: 3,
        auth_per_second: 60,
        auth_burst_size: 1,
    }
}

fn login_request(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::to_string(&json!({
                "email": unique_email(),
                "password": "password123"
            }))
            .unwrap(),
        ))
        .unwrap()
}

fn health_request(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_auth_rate_limit_exceeded() {
    let app = setup_with_rate_limit(strict_rate_limit_config());

    let (status, _) = app.send(login_request("192.168.1.100")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(login_request("192.168.1.100")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_is_per_client_ip() {
    let app = setup_with_rate_limit(strict_rate_limit_config());

    let (status, _) = app.send(login_request("10.0.0.1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(login_request("10.0.0.2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_general_rate_limit_exceeded() {
    let app = setup_with_rate_limit(strict_rate_limit_config());

    for _ in 0..3 {
        let (status, _) = app
            .send(health_request("/api/testimonials", "172.16.0.5"))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = app
        .send(health_request("/api/testimonials", "172.16.0.5"))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let app = setup_with_rate_limit(strict_rate_limit_config());

    for _ in 0..5 {
        let (status, body) = app.send(health_request("/health", "172.16.0.9")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}

#[tokio::test]
async fn test_disabled_rate_limit_allows_bursts() {
    let app = setup_with_rate_limit(RateLimitConfig::disabled());

    for _ in 0..5 {
        let (status, _) = app.send(login_request("192.168.1.200")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
