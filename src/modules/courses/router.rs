use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    add_prerequisite, assign_faculty, create_course, delete_course, get_active_courses,
    get_course, get_courses, get_courses_by_branch, get_courses_by_semester, remove_prerequisite,
    update_course,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(get_courses))
        .route("/active", get(get_active_courses))
        .route("/branch/{branch_id}", get(get_courses_by_branch))
        .route("/semester/{semester}", get(get_courses_by_semester))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/assign-faculty", post(assign_faculty))
        .route("/{id}/prerequisites", post(add_prerequisite))
        .route(
            "/{id}/prerequisites/{prerequisite_id}",
            delete(remove_prerequisite),
        )
}
