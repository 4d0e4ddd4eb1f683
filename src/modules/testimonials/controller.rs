use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse};
use collegium_models::TestimonialId;
use collegium_models::testimonials::{
    CreateTestimonialDto, Testimonial, TestimonialFilterParams, UpdateTestimonialDto,
};
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::testimonials::service::TestimonialService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/testimonials",
    request_body = CreateTestimonialDto,
    responses(
        (status = 201, description = "Testimonial created successfully", body = ApiResponse<Testimonial>),
        (status = 400, description = "Invalid input or missing image"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Testimonials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_testimonial(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateTestimonialDto>,
) -> Result<(StatusCode, Json<ApiResponse<Testimonial>>), AppError> {
    let testimonial = TestimonialService::create(&state.repos, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Testimonial created successfully",
            testimonial,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/testimonials",
    params(TestimonialFilterParams),
    responses((status = 200, description = "Testimonials in display order", body = ApiResponse<Vec<Testimonial>>)),
    tag = "Testimonials"
)]
#[instrument(skip(state))]
pub async fn get_testimonials(
    State(state): State<AppState>,
    filters: Result<Query<TestimonialFilterParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Testimonial>>>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let testimonials = TestimonialService::list(&state.repos, filters).await?;
    Ok(Json(ApiResponse::ok(testimonials)))
}

#[utoipa::path(
    get,
    path = "/api/testimonials/{id}",
    params(("id" = Uuid, Path, description = "Testimonial ID")),
    responses(
        (status = 200, description = "Testimonial", body = ApiResponse<Testimonial>),
        (status = 404, description = "Testimonial not found")
    ),
    tag = "Testimonials"
)]
#[instrument(skip(state))]
pub async fn get_testimonial(
    State(state): State<AppState>,
    Path(id): Path<TestimonialId>,
) -> Result<Json<ApiResponse<Testimonial>>, AppError> {
    let testimonial = TestimonialService::get(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(testimonial)))
}

#[utoipa::path(
    put,
    path = "/api/testimonials/{id}",
    params(("id" = Uuid, Path, description = "Testimonial ID")),
    request_body = UpdateTestimonialDto,
    responses(
        (status = 200, description = "Testimonial updated successfully", body = ApiResponse<Testimonial>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Testimonial not found")
    ),
    tag = "Testimonials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_testimonial(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<TestimonialId>,
    ValidatedJson(dto): ValidatedJson<UpdateTestimonialDto>,
) -> Result<Json<ApiResponse<Testimonial>>, AppError> {
    let testimonial =
        TestimonialService::update(&state.repos, &state.image_cleanup, id, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Testimonial updated successfully",
        testimonial,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/testimonials/{id}",
    params(("id" = Uuid, Path, description = "Testimonial ID")),
    responses(
        (status = 200, description = "Testimonial deleted successfully", body = MessageResponse),
        (status = 404, description = "Testimonial not found")
    ),
    tag = "Testimonials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_testimonial(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<TestimonialId>,
) -> Result<Json<MessageResponse>, AppError> {
    TestimonialService::delete(&state.repos, &state.image_cleanup, id).await?;
    Ok(Json(MessageResponse::new("Testimonial deleted successfully")))
}

#[utoipa::path(
    patch,
    path = "/api/testimonials/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "Testimonial ID")),
    responses(
        (status = 200, description = "Status toggled", body = ApiResponse<Testimonial>),
        (status = 404, description = "Testimonial not found")
    ),
    tag = "Testimonials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn toggle_testimonial_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<TestimonialId>,
) -> Result<Json<ApiResponse<Testimonial>>, AppError> {
    let testimonial = TestimonialService::toggle_status(&state.repos, id).await?;
    let message = if testimonial.is_active {
        "Testimonial activated successfully"
    } else {
        "Testimonial deactivated successfully"
    };
    Ok(Json(ApiResponse::with_message(message, testimonial)))
}
