use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_faculty, delete_faculty, get_active_faculty, get_faculty, get_faculty_list,
    toggle_faculty_status, update_faculty,
};

pub fn init_faculty_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_faculty).get(get_faculty_list))
        .route("/active", get(get_active_faculty))
        .route(
            "/{id}",
            get(get_faculty).put(update_faculty).delete(delete_faculty),
        )
        .route("/{id}/toggle-status", patch(toggle_faculty_status))
}
