use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse, PaginatedResponse};
use collegium_models::faculty::{
    CreateFacultyDto, Faculty, FacultyDetails, FacultyFilterParams, UpdateFacultyDto,
};
use collegium_models::FacultyId;
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::faculty::service::FacultyService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/faculty",
    request_body = CreateFacultyDto,
    responses(
        (status = 201, description = "Faculty created successfully", body = ApiResponse<Faculty>),
        (status = 400, description = "Invalid input, missing image or duplicate employee id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Faculty",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_faculty(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateFacultyDto>,
) -> Result<(StatusCode, Json<ApiResponse<Faculty>>), AppError> {
    let faculty = FacultyService::create_faculty(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Faculty created successfully", faculty)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/faculty",
    params(FacultyFilterParams),
    responses(
        (status = 200, description = "Paginated faculty", body = PaginatedResponse<Faculty>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Faculty",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_faculty_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    filters: Result<Query<FacultyFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Faculty>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let page = FacultyService::list_faculty(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/faculty/active",
    responses((status = 200, description = "Active faculty", body = ApiResponse<Vec<Faculty>>)),
    tag = "Faculty"
)]
#[instrument(skip(state))]
pub async fn get_active_faculty(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Faculty>>>, AppError> {
    let faculty = FacultyService::list_active(&state.repos).await?;
    Ok(Json(ApiResponse::ok(faculty)))
}

#[utoipa::path(
    get,
    path = "/api/faculty/{id}",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty with courses", body = ApiResponse<FacultyDetails>),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculty"
)]
#[instrument(skip(state))]
pub async fn get_faculty(
    State(state): State<AppState>,
    Path(id): Path<FacultyId>,
) -> Result<Json<ApiResponse<FacultyDetails>>, AppError> {
    let faculty = FacultyService::get_faculty(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(faculty)))
}

#[utoipa::path(
    put,
    path = "/api/faculty/{id}",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    request_body = UpdateFacultyDto,
    responses(
        (status = 200, description = "Faculty updated successfully", body = ApiResponse<Faculty>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculty",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_faculty(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<FacultyId>,
    ValidatedJson(dto): ValidatedJson<UpdateFacultyDto>,
) -> Result<Json<ApiResponse<Faculty>>, AppError> {
    let faculty =
        FacultyService::update_faculty(&state.repos, &state.image_cleanup, id, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Faculty updated successfully",
        faculty,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/faculty/{id}",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty deleted successfully", body = MessageResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculty",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_faculty(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<FacultyId>,
) -> Result<Json<MessageResponse>, AppError> {
    FacultyService::delete_faculty(&state.repos, &state.image_cleanup, id).await?;
    Ok(Json(MessageResponse::new("Faculty deleted successfully")))
}

#[utoipa::path(
    patch,
    path = "/api/faculty/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty status toggled", body = ApiResponse<Faculty>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculty",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn toggle_faculty_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<FacultyId>,
) -> Result<Json<ApiResponse<Faculty>>, AppError> {
    let faculty = FacultyService::toggle_status(&state.repos, id).await?;
    let message = if faculty.is_active {
        "Faculty activated successfully"
    } else {
        "Faculty deactivated successfully"
    };
    Ok(Json(ApiResponse::with_message(message, faculty)))
}
