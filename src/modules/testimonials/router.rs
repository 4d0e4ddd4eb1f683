use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_testimonial, delete_testimonial, get_testimonial, get_testimonials,
    toggle_testimonial_status, update_testimonial,
};

pub fn init_testimonials_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_testimonial).get(get_testimonials))
        .route(
            "/{id}",
            get(get_testimonial)
                .put(update_testimonial)
                .delete(delete_testimonial),
        )
        .route("/{id}/toggle-status", patch(toggle_testimonial_status))
}
