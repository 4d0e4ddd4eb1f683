use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    add_branch_images, assign_department_head, create_branch, delete_branch, get_active_branches,
    get_branch, get_branch_statistics, get_branches, remove_branch_image, update_branch,
    update_seats,
};

pub fn init_branches_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_branch).get(get_branches))
        .route("/active", get(get_active_branches))
        .route(
            "/{id}",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
        .route("/{id}/statistics", get(get_branch_statistics))
        .route("/{id}/assign-head", post(assign_department_head))
        .route("/{id}/seats", patch(update_seats))
        .route("/{id}/images", post(add_branch_images))
        .route("/{id}/images/{*public_id}", delete(remove_branch_image))
}
