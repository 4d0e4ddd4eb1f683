use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse, PaginatedResponse};
use collegium_models::courses::{
    AssignFacultyDto, Course, CourseDetails, CourseFilterParams, CreateCourseDto,
    PrerequisiteDto, UpdateCourseDto,
};
use collegium_models::students::BranchScopeParams;
use collegium_models::{BranchId, CourseId};
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created successfully", body = ApiResponse<Course>),
        (status = 400, description = "Invalid input, duplicate code or unknown branch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<ApiResponse<Course>>), AppError> {
    let course = CourseService::create_course(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Course created successfully", course)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Paginated courses", body = PaginatedResponse<Course>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    filters: Result<Query<CourseFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Course>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let page = CourseService::list_courses(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/courses/active",
    responses((status = 200, description = "Active courses", body = ApiResponse<Vec<Course>>)),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_active_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = CourseService::list_active(&state.repos).await?;
    Ok(Json(ApiResponse::ok(courses)))
}

#[utoipa::path(
    get,
    path = "/api/courses/branch/{branch_id}",
    params(("branch_id" = Uuid, Path, description = "Branch ID")),
    responses((status = 200, description = "Active courses of the branch", body = ApiResponse<Vec<Course>>)),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses_by_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<BranchId>,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = CourseService::list_by_branch(&state.repos, branch_id).await?;
    Ok(Json(ApiResponse::ok(courses)))
}

#[utoipa::path(
    get,
    path = "/api/courses/semester/{semester}",
    params(
        ("semester" = i32, Path, description = "Semester (1-8)"),
        BranchScopeParams
    ),
    responses(
        (status = 200, description = "Active courses of the semester", body = ApiResponse<Vec<Course>>),
        (status = 400, description = "Semester out of range")
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses_by_semester(
    State(state): State<AppState>,
    Path(semester): Path<i32>,
    scope: Result<Query<BranchScopeParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let Query(scope) =
        scope.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let courses = CourseService::list_by_semester(&state.repos, semester, scope.branch_id).await?;
    Ok(Json(ApiResponse::ok(courses)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with branch, faculty and prerequisites", body = ApiResponse<CourseDetails>),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<CourseId>,
) -> Result<Json<ApiResponse<CourseDetails>>, AppError> {
    let course = CourseService::get_course(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated successfully", body = ApiResponse<Course>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::update_course(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Course updated successfully", course)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted successfully", body = MessageResponse),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete_course(&state.repos, id).await?;
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/assign-faculty",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = AssignFacultyDto,
    responses(
        (status = 200, description = "Faculty assigned successfully", body = ApiResponse<Course>),
        (status = 400, description = "Faculty not found or invalid role"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn assign_faculty(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<CourseId>,
    Json(dto): Json<AssignFacultyDto>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::assign_faculty(&state.repos, id, dto.faculty_id).await?;
    Ok(Json(ApiResponse::with_message("Faculty assigned successfully", course)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/prerequisites",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = PrerequisiteDto,
    responses(
        (status = 200, description = "Prerequisite added", body = ApiResponse<Course>),
        (status = 400, description = "Unknown or self-referencing prerequisite"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn add_prerequisite(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<CourseId>,
    Json(dto): Json<PrerequisiteDto>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::add_prerequisite(&state.repos, id, dto.prerequisite_id).await?;
    Ok(Json(ApiResponse::with_message("Prerequisite added successfully", course)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/prerequisites/{prerequisite_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("prerequisite_id" = Uuid, Path, description = "Prerequisite course ID")
    ),
    responses(
        (status = 200, description = "Prerequisite removed", body = ApiResponse<Course>),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_prerequisite(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, prerequisite_id)): Path<(CourseId, CourseId)>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::remove_prerequisite(&state.repos, id, prerequisite_id).await?;
    Ok(Json(ApiResponse::with_message("Prerequisite removed successfully", course)))
}
