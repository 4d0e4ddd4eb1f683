use crate::modules::users::controller::{get_user_profile, set_user_status};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/status", patch(set_user_status))
        .route("/{id}/profile", get(get_user_profile))
}
