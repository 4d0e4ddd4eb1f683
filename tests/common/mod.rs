#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use collegium::router::init_router;
use collegium::state::AppState;
use collegium::store::{MemoryStore, Repositories};
use collegium_config::{
    CorsConfig, JwtConfig, RateLimitConfig, ServerConfig, StorageBackend, StorageConfig,
};
use collegium_core::image_storage::MemoryImageStorage;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub store: MemoryStore,
    pub storage: MemoryImageStorage,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration_test_secret_key".to_string(),
        refresh_secret: "integration_test_refresh_secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 7200,
    }
}

fn storage_config() -> StorageConfig {
    StorageConfig {
        backend: StorageBackend::Local,
        root_folder: "collegium".to_string(),
        upload_dir: "unused".to_string(),
        upload_base_url: "http://localhost/uploads".to_string(),
    }
}

pub fn setup_with_rate_limit(rate_limit: RateLimitConfig) -> TestApp {
    let store = MemoryStore::new();
    let repos = Repositories::from_memory(store.clone());
    let storage = MemoryImageStorage::new();
    let state = AppState::new(
        repos.clone(),
        Arc::new(storage.clone()),
        jwt_config(),
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit,
        storage_config(),
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            image_reconcile_interval_secs: 300,
            image_reconcile_batch_size: 50,
        },
    );
    TestApp {
        router: init_router(state),
        repos,
        store,
        storage,
    }
}

/// In-memory app with limiting off and the default branch in place.
pub async fn setup_test_app() -> TestApp {
    let app = setup_with_rate_limit(RateLimitConfig::disabled());
    app.repos.branches.ensure_default().await.unwrap();
    app
}

pub fn unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, None).await
    }

    /// Registers an account and returns the `data` part of the response.
    pub async fn register(&self, role: &str, email: &str, caller: Option<&str>) -> Value {
        let (status, body) = self
            .post(
                "/api/auth/register",
                caller,
                json!({
                    "name": "Test User",
                    "email": email,
                    "password": PASSWORD,
                    "role": role
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["data"].clone()
    }

    /// Registers the bootstrap admin and returns its token.
    pub async fn admin_token(&self) -> String {
        let data = self.register("admin", &unique_email(), None).await;
        data["token"].as_str().unwrap().to_string()
    }

    /// Registers a user of `role` and returns `(user id, token)`.
    pub async fn user_token(&self, role: &str) -> (String, String) {
        let data = self.register(role, &unique_email(), None).await;
        (
            data["user"]["id"].as_str().unwrap().to_string(),
            data["token"].as_str().unwrap().to_string(),
        )
    }
}

pub fn image(public_id: &str) -> Value {
    json!({
        "url": format!("https://images.test/{}", public_id),
        "public_id": public_id
    })
}
