use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse};
use collegium_models::OutstandingStudentId;
use collegium_models::outstanding_students::{
    ActiveFilterParams, CreateOutstandingStudentDto, OutstandingStudent,
    UpdateOutstandingStudentDto,
};
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::outstanding_students::service::OutstandingStudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/outstanding-students",
    request_body = CreateOutstandingStudentDto,
    responses(
        (status = 201, description = "Outstanding student created successfully", body = ApiResponse<OutstandingStudent>),
        (status = 400, description = "Invalid input or rank taken"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Outstanding Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_outstanding_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateOutstandingStudentDto>,
) -> Result<(StatusCode, Json<ApiResponse<OutstandingStudent>>), AppError> {
    let record = OutstandingStudentService::create(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Outstanding student created successfully",
            record,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/outstanding-students",
    params(ActiveFilterParams),
    responses((status = 200, description = "Outstanding students by rank", body = ApiResponse<Vec<OutstandingStudent>>)),
    tag = "Outstanding Students"
)]
#[instrument(skip(state))]
pub async fn get_outstanding_students(
    State(state): State<AppState>,
    filters: Result<Query<ActiveFilterParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<OutstandingStudent>>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let records = OutstandingStudentService::list(&state.repos, filters.is_active).await?;
    Ok(Json(ApiResponse::ok(records)))
}

#[utoipa::path(
    get,
    path = "/api/outstanding-students/{id}",
    params(("id" = Uuid, Path, description = "Outstanding student ID")),
    responses(
        (status = 200, description = "Outstanding student", body = ApiResponse<OutstandingStudent>),
        (status = 404, description = "Outstanding student not found")
    ),
    tag = "Outstanding Students"
)]
#[instrument(skip(state))]
pub async fn get_outstanding_student(
    State(state): State<AppState>,
    Path(id): Path<OutstandingStudentId>,
) -> Result<Json<ApiResponse<OutstandingStudent>>, AppError> {
    let record = OutstandingStudentService::get(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

#[utoipa::path(
    put,
    path = "/api/outstanding-students/{id}",
    params(("id" = Uuid, Path, description = "Outstanding student ID")),
    request_body = UpdateOutstandingStudentDto,
    responses(
        (status = 200, description = "Outstanding student updated successfully", body = ApiResponse<OutstandingStudent>),
        (status = 400, description = "Invalid input or rank taken"),
        (status = 404, description = "Outstanding student not found")
    ),
    tag = "Outstanding Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_outstanding_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<OutstandingStudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateOutstandingStudentDto>,
) -> Result<Json<ApiResponse<OutstandingStudent>>, AppError> {
    let record =
        OutstandingStudentService::update(&state.repos, &state.image_cleanup, id, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Outstanding student updated successfully",
        record,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/outstanding-students/{id}",
    params(("id" = Uuid, Path, description = "Outstanding student ID")),
    responses(
        (status = 200, description = "Outstanding student deleted successfully", body = MessageResponse),
        (status = 404, description = "Outstanding student not found")
    ),
    tag = "Outstanding Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_outstanding_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<OutstandingStudentId>,
) -> Result<Json<MessageResponse>, AppError> {
    OutstandingStudentService::delete(&state.repos, &state.image_cleanup, id).await?;
    Ok(Json(MessageResponse::new(
        "Outstanding student deleted successfully",
    )))
}

#[utoipa::path(
    patch,
    path = "/api/outstanding-students/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "Outstanding student ID")),
    responses(
        (status = 200, description = "Status toggled", body = ApiResponse<OutstandingStudent>),
        (status = 404, description = "Outstanding student not found")
    ),
    tag = "Outstanding Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn toggle_outstanding_student_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<OutstandingStudentId>,
) -> Result<Json<ApiResponse<OutstandingStudent>>, AppError> {
    let record = OutstandingStudentService::toggle_status(&state.repos, id).await?;
    let message = if record.is_active {
        "Student activated successfully"
    } else {
        "Student deactivated successfully"
    };
    Ok(Json(ApiResponse::with_message(message, record)))
}
