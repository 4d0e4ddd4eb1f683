use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    change_password, get_me, login, logout, refresh_token, register, update_profile,
};

/// Credential endpoints, the ones the rate limiter wraps.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
}

/// Session endpoints for an already authenticated caller.
pub fn init_session_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_me))
        .route("/profile", put(update_profile))
        .route("/change-password", put(change_password))
}
