use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_inquiry, delete_inquiry, get_inquiries, get_inquiry, get_inquiry_stats, update_inquiry,
};

pub fn init_course_inquiries_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_inquiry).get(get_inquiries))
        .route("/stats", get(get_inquiry_stats))
        .route(
            "/{id}",
            get(get_inquiry).put(update_inquiry).delete(delete_inquiry),
        )
}
