use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_outstanding_student, delete_outstanding_student, get_outstanding_student,
    get_outstanding_students, toggle_outstanding_student_status, update_outstanding_student,
};

pub fn init_outstanding_students_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_outstanding_student).get(get_outstanding_students),
        )
        .route(
            "/{id}",
            get(get_outstanding_student)
                .put(update_outstanding_student)
                .delete(delete_outstanding_student),
        )
        .route(
            "/{id}/toggle-status",
            patch(toggle_outstanding_student_status),
        )
}
