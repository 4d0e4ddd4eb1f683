use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse, PaginatedResponse};
use collegium_models::BranchId;
use collegium_models::branches::{
    AssignDepartmentHeadDto, Branch, BranchDetails, BranchFilterParams, BranchStatistics,
    CreateBranchDto, UpdateBranchDto, UpdateSeatsDto,
};
use collegium_models::images::AddImagesDto;
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::branches::service::BranchService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/branches",
    request_body = CreateBranchDto,
    responses(
        (status = 201, description = "Branch created successfully", body = ApiResponse<Branch>),
        (status = 400, description = "Invalid input or duplicate branch code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_branch(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateBranchDto>,
) -> Result<(StatusCode, Json<ApiResponse<Branch>>), AppError> {
    let branch = BranchService::create_branch(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Branch created successfully", branch)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/branches",
    params(BranchFilterParams),
    responses(
        (status = 200, description = "Paginated branches", body = PaginatedResponse<Branch>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Branches"
)]
#[instrument(skip(state))]
pub async fn get_branches(
    State(state): State<AppState>,
    filters: Result<Query<BranchFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Branch>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let page = BranchService::list_branches(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/branches/active",
    responses(
        (status = 200, description = "Active branches sorted by name", body = ApiResponse<Vec<Branch>>)
    ),
    tag = "Branches"
)]
#[instrument(skip(state))]
pub async fn get_active_branches(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Branch>>>, AppError> {
    let branches = BranchService::list_active_branches(&state.repos).await?;
    Ok(Json(ApiResponse::ok(branches)))
}

#[utoipa::path(
    get,
    path = "/api/branches/{id}",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch with department head", body = ApiResponse<BranchDetails>),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches"
)]
#[instrument(skip(state))]
pub async fn get_branch(
    State(state): State<AppState>,
    Path(id): Path<BranchId>,
) -> Result<Json<ApiResponse<BranchDetails>>, AppError> {
    let branch = BranchService::get_branch(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(branch)))
}

#[utoipa::path(
    get,
    path = "/api/branches/{id}/statistics",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Seat occupancy and user count", body = ApiResponse<BranchStatistics>),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches"
)]
#[instrument(skip(state))]
pub async fn get_branch_statistics(
    State(state): State<AppState>,
    Path(id): Path<BranchId>,
) -> Result<Json<ApiResponse<BranchStatistics>>, AppError> {
    let stats = BranchService::get_statistics(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

#[utoipa::path(
    put,
    path = "/api/branches/{id}",
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = UpdateBranchDto,
    responses(
        (status = 200, description = "Branch updated successfully", body = ApiResponse<Branch>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_branch(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<BranchId>,
    ValidatedJson(dto): ValidatedJson<UpdateBranchDto>,
) -> Result<Json<ApiResponse<Branch>>, AppError> {
    let branch = BranchService::update_branch(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Branch updated successfully", branch)))
}

#[utoipa::path(
    delete,
    path = "/api/branches/{id}",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch deleted successfully", body = MessageResponse),
        (status = 400, description = "Branch still has users"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_branch(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<BranchId>,
) -> Result<Json<MessageResponse>, AppError> {
    BranchService::delete_branch(&state.repos, &state.image_cleanup, id).await?;
    Ok(Json(MessageResponse::new("Branch deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/branches/{id}/assign-head",
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = AssignDepartmentHeadDto,
    responses(
        (status = 200, description = "Department head assigned successfully", body = ApiResponse<Branch>),
        (status = 400, description = "Invalid faculty member"),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn assign_department_head(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<BranchId>,
    Json(dto): Json<AssignDepartmentHeadDto>,
) -> Result<Json<ApiResponse<Branch>>, AppError> {
    let branch = BranchService::assign_department_head(&state.repos, id, dto.faculty_id).await?;
    Ok(Json(ApiResponse::with_message(
        "Department head assigned successfully",
        branch,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/branches/{id}/seats",
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = UpdateSeatsDto,
    responses(
        (status = 200, description = "Seats updated", body = ApiResponse<Branch>),
        (status = 400, description = "Not enough seats or over capacity"),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn update_seats(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<BranchId>,
    Json(dto): Json<UpdateSeatsDto>,
) -> Result<Json<ApiResponse<Branch>>, AppError> {
    let branch =
        BranchService::update_seats_availability(&state.repos, id, dto.seat_change).await?;
    Ok(Json(ApiResponse::with_message("Seats updated successfully", branch)))
}

#[utoipa::path(
    post,
    path = "/api/branches/{id}/images",
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = AddImagesDto,
    responses(
        (status = 200, description = "Images added", body = ApiResponse<Branch>),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn add_branch_images(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<BranchId>,
    ValidatedJson(dto): ValidatedJson<AddImagesDto>,
) -> Result<Json<ApiResponse<Branch>>, AppError> {
    let branch = BranchService::add_images(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Images added successfully", branch)))
}

#[utoipa::path(
    delete,
    path = "/api/branches/{id}/images/{public_id}",
    params(
        ("id" = Uuid, Path, description = "Branch ID"),
        ("public_id" = String, Path, description = "Remote image identifier")
    ),
    responses(
        (status = 200, description = "Image removed", body = ApiResponse<Branch>),
        (status = 404, description = "Branch or image not found")
    ),
    tag = "Branches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_branch_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, public_id)): Path<(BranchId, String)>,
) -> Result<Json<ApiResponse<Branch>>, AppError> {
    let branch =
        BranchService::remove_image(&state.repos, &state.image_cleanup, id, &public_id).await?;
    Ok(Json(ApiResponse::with_message("Image removed successfully", branch)))
}
