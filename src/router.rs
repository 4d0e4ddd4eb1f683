use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use collegium_observability::{logging_middleware, metrics_middleware};
use serde_json::{Value, json};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::modules::auth::router::{init_auth_router, init_session_router};
use crate::modules::branches::router::init_branches_router;
use crate::modules::course_inquiries::router::init_course_inquiries_router;
use crate::modules::courses::router::init_courses_router;
use crate::modules::events::router::init_events_router;
use crate::modules::faculty::router::init_faculty_router;
use crate::modules::outstanding_students::router::init_outstanding_students_router;
use crate::modules::students::router::init_students_router;
use crate::modules::testimonials::router::init_testimonials_router;
use crate::modules::uploads::router::init_uploads_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Credential routes, behind the stricter limiter when limiting is on.
fn auth_routes(state: &AppState) -> Router<AppState> {
    let credentials = init_auth_router();
    let credentials = if !state.rate_limit_config.enabled {
        credentials
    } else if let Some(config) = state.rate_limit_config.auth_governor_config() {
        credentials.layer(GovernorLayer::new(Arc::new(config)))
    } else {
        warn!("invalid auth rate limit settings, auth routes are not limited");
        credentials
    };
    credentials.merge(init_session_router())
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes(state))
        .nest("/users", init_users_router())
        .nest("/branches", init_branches_router())
        .nest("/courses", init_courses_router())
        .nest("/students", init_students_router())
        .nest("/faculty", init_faculty_router())
        .nest("/events", init_events_router())
        .nest("/outstanding-students", init_outstanding_students_router())
        .nest("/testimonials", init_testimonials_router())
        .nest("/course-inquiries", init_course_inquiries_router())
        .nest("/uploads", init_uploads_router());

    if !state.rate_limit_config.enabled {
        return api;
    }
    match state.rate_limit_config.general_governor_config() {
        Some(config) => api.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            warn!("invalid general rate limit settings, API routes are not limited");
            api
        }
    }
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api_routes(&state))
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
