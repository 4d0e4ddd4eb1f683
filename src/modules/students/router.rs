use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    add_achievement, enroll_course, get_outstanding_students, get_student,
    get_student_by_user_id, get_students, get_students_by_semester, get_top_performers,
    promote_student, unenroll_course, update_attendance, update_gpa, update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_students))
        .route("/outstanding", get(get_outstanding_students))
        .route("/top-performers", get(get_top_performers))
        .route("/semester/{semester}", get(get_students_by_semester))
        .route("/user/{user_id}", get(get_student_by_user_id))
        .route("/{id}", get(get_student).put(update_student))
        .route("/{id}/gpa", put(update_gpa))
        .route("/{id}/attendance", put(update_attendance))
        .route("/{id}/promote", post(promote_student))
        .route("/{id}/achievements", post(add_achievement))
        .route("/{id}/courses", post(enroll_course))
        .route("/{id}/courses/{course_id}", delete(unenroll_course))
}
