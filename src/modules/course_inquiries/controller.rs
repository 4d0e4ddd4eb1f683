use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse, PaginatedResponse};
use collegium_models::InquiryId;
use collegium_models::inquiries::{
    CourseInquiry, CreateInquiryDto, InquiryFilterParams, InquiryStats, UpdateInquiryDto,
};
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::course_inquiries::service::InquiryService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/course-inquiries",
    request_body = CreateInquiryDto,
    responses(
        (status = 201, description = "Inquiry submitted successfully", body = ApiResponse<CourseInquiry>),
        (status = 400, description = "Invalid input")
    ),
    tag = "Course Inquiries"
)]
#[instrument(skip(state, dto))]
pub async fn create_inquiry(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateInquiryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CourseInquiry>>), AppError> {
    let inquiry = InquiryService::create(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Inquiry submitted successfully",
            inquiry,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/course-inquiries",
    params(InquiryFilterParams),
    responses(
        (status = 200, description = "Paginated inquiries", body = PaginatedResponse<CourseInquiry>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Course Inquiries",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_inquiries(
    State(state): State<AppState>,
    _admin: AdminUser,
    filters: Result<Query<InquiryFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<CourseInquiry>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let page = InquiryService::list(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/course-inquiries/stats",
    responses(
        (status = 200, description = "Inquiry counts by status", body = ApiResponse<InquiryStats>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Course Inquiries",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_inquiry_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<InquiryStats>>, AppError> {
    let stats = InquiryService::stats(&state.repos).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

#[utoipa::path(
    get,
    path = "/api/course-inquiries/{id}",
    params(("id" = Uuid, Path, description = "Inquiry ID")),
    responses(
        (status = 200, description = "Inquiry", body = ApiResponse<CourseInquiry>),
        (status = 404, description = "Inquiry not found")
    ),
    tag = "Course Inquiries",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_inquiry(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<InquiryId>,
) -> Result<Json<ApiResponse<CourseInquiry>>, AppError> {
    let inquiry = InquiryService::get(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(inquiry)))
}

#[utoipa::path(
    put,
    path = "/api/course-inquiries/{id}",
    params(("id" = Uuid, Path, description = "Inquiry ID")),
    request_body = UpdateInquiryDto,
    responses(
        (status = 200, description = "Inquiry updated successfully", body = ApiResponse<CourseInquiry>),
        (status = 404, description = "Inquiry not found")
    ),
    tag = "Course Inquiries",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_inquiry(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<InquiryId>,
    ValidatedJson(dto): ValidatedJson<UpdateInquiryDto>,
) -> Result<Json<ApiResponse<CourseInquiry>>, AppError> {
    let inquiry = InquiryService::update(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Inquiry updated successfully",
        inquiry,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/course-inquiries/{id}",
    params(("id" = Uuid, Path, description = "Inquiry ID")),
    responses(
        (status = 200, description = "Inquiry deleted successfully", body = MessageResponse),
        (status = 404, description = "Inquiry not found")
    ),
    tag = "Course Inquiries",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_inquiry(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<InquiryId>,
) -> Result<Json<MessageResponse>, AppError> {
    InquiryService::delete(&state.repos, id).await?;
    Ok(Json(MessageResponse::new("Inquiry deleted successfully")))
}
