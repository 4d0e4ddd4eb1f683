use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use collegium_core::{ApiResponse, AppError, PaginatedResponse, PaginationParams};
use collegium_models::students::{
    AddAchievementDto, BranchScopeParams, EnrollCourseDto, Student, StudentDetails,
    StudentFilterParams, TopPerformersParams, UpdateAttendanceDto, UpdateGpaDto,
    UpdateStudentDto,
};
use collegium_models::{CourseId, StudentId, UserId};
use tracing::instrument;

use crate::middleware::auth::{AdminUser, AuthUser, FacultyUser};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn query_error(e: QueryRejection) -> AppError {
    AppError::bad_request(anyhow!("Invalid query parameters: {}", e))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = PaginatedResponse<Student>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    filters: Result<Query<StudentFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Student>>, AppError> {
    let Query(filters) = filters.map_err(query_error)?;
    let page = StudentService::list_students(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/students/outstanding",
    params(PaginationParams),
    responses((status = 200, description = "Outstanding students, best GPA first", body = PaginatedResponse<Student>)),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_outstanding_students(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Student>>, AppError> {
    let Query(pagination) = pagination.map_err(query_error)?;
    let page = StudentService::list_outstanding(&state.repos, pagination).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/students/top-performers",
    params(TopPerformersParams),
    responses((status = 200, description = "Students by GPA, highest first", body = ApiResponse<Vec<Student>>)),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_top_performers(
    State(state): State<AppState>,
    params: Result<Query<TopPerformersParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Student>>>, AppError> {
    let Query(params) = params.map_err(query_error)?;
    let students =
        StudentService::top_performers(&state.repos, params.limit(), params.branch_id).await?;
    Ok(Json(ApiResponse::ok(students)))
}

#[utoipa::path(
    get,
    path = "/api/students/semester/{semester}",
    params(
        ("semester" = i32, Path, description = "Semester (1-8)"),
        BranchScopeParams
    ),
    responses(
        (status = 200, description = "Students in the semester", body = ApiResponse<Vec<Student>>),
        (status = 400, description = "Semester out of range")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students_by_semester(
    State(state): State<AppState>,
    Path(semester): Path<i32>,
    scope: Result<Query<BranchScopeParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Student>>>, AppError> {
    let Query(scope) = scope.map_err(query_error)?;
    let students =
        StudentService::list_by_semester(&state.repos, semester, scope.branch_id).await?;
    Ok(Json(ApiResponse::ok(students)))
}

#[utoipa::path(
    get,
    path = "/api/students/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "Owning user ID")),
    responses(
        (status = 200, description = "Student profile", body = ApiResponse<StudentDetails>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_student_by_user_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<StudentDetails>>, AppError> {
    let student = StudentService::get_by_user_id(&state.repos, user_id).await?;
    Ok(Json(ApiResponse::ok(student)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student with user and courses", body = ApiResponse<StudentDetails>),
        (status = 404, description = "Student not found")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<Json<ApiResponse<StudentDetails>>, AppError> {
    let student = StudentService::get_student(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(student)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = ApiResponse<Student>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::update_student(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Student updated successfully", student)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/gpa",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateGpaDto,
    responses(
        (status = 200, description = "GPA updated", body = ApiResponse<Student>),
        (status = 400, description = "GPA out of range"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _faculty, dto))]
pub async fn update_gpa(
    State(state): State<AppState>,
    _faculty: FacultyUser,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateGpaDto>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::update_gpa(&state.repos, id, dto.gpa).await?;
    Ok(Json(ApiResponse::with_message("GPA updated successfully", student)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/attendance",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Attendance updated", body = ApiResponse<Student>),
        (status = 400, description = "Attendance out of range"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _faculty, dto))]
pub async fn update_attendance(
    State(state): State<AppState>,
    _faculty: FacultyUser,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::update_attendance(&state.repos, id, dto.attendance).await?;
    Ok(Json(ApiResponse::with_message(
        "Attendance updated successfully",
        student,
    )))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/promote",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student promoted", body = ApiResponse<Student>),
        (status = 400, description = "Already in the final semester"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn promote_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<StudentId>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::promote(&state.repos, id).await?;
    Ok(Json(ApiResponse::with_message(
        "Student promoted successfully",
        student,
    )))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/achievements",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = AddAchievementDto,
    responses(
        (status = 200, description = "Achievement added", body = ApiResponse<Student>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _faculty, dto))]
pub async fn add_achievement(
    State(state): State<AppState>,
    _faculty: FacultyUser,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<AddAchievementDto>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::add_achievement(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Achievement added successfully",
        student,
    )))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/courses",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = EnrollCourseDto,
    responses(
        (status = 200, description = "Student enrolled", body = ApiResponse<Student>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student or course not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn enroll_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<EnrollCourseDto>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::enroll_course(&state.repos, id, dto.course_id).await?;
    Ok(Json(ApiResponse::with_message(
        "Student enrolled successfully",
        student,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}/courses/{course_id}",
    params(
        ("id" = Uuid, Path, description = "Student ID"),
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Student unenrolled", body = ApiResponse<Student>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student or course not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn unenroll_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, course_id)): Path<(StudentId, CourseId)>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = StudentService::unenroll_course(&state.repos, id, course_id).await?;
    Ok(Json(ApiResponse::with_message(
        "Student unenrolled successfully",
        student,
    )))
}
