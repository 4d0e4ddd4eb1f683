use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError, MessageResponse, PaginatedResponse, PaginationParams};
use collegium_models::events::{
    CreateEventDto, Event, EventDetails, EventFilterParams, EventType, RegistrationStatus,
    UpdateEventDto,
};
use collegium_models::images::AddGalleryImageDto;
use collegium_models::EventId;
use tracing::instrument;

use crate::middleware::auth::{AdminUser, AuthUser};
use crate::modules::events::service::EventService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn query_error(e: QueryRejection) -> AppError {
    AppError::bad_request(anyhow!("Invalid query parameters: {}", e))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventDto,
    responses(
        (status = 201, description = "Event created successfully", body = ApiResponse<Event>),
        (status = 400, description = "Invalid input or missing image"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_event(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateEventDto>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), AppError> {
    let event = EventService::create_event(&state.repos, admin.0.id(), dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Event created successfully", event)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventFilterParams),
    responses(
        (status = 200, description = "Paginated events", body = PaginatedResponse<Event>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_events(
    State(state): State<AppState>,
    filters: Result<Query<EventFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Event>>, AppError> {
    let Query(filters) = filters.map_err(query_error)?;
    let page = EventService::list_events(&state.repos, filters).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/events/upcoming",
    params(PaginationParams),
    responses((status = 200, description = "Upcoming events, soonest first", body = PaginatedResponse<Event>)),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_upcoming_events(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Event>>, AppError> {
    let Query(pagination) = pagination.map_err(query_error)?;
    let page = EventService::upcoming(&state.repos, pagination).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/events/past",
    params(PaginationParams),
    responses((status = 200, description = "Past events, most recent first", body = PaginatedResponse<Event>)),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_past_events(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Event>>, AppError> {
    let Query(pagination) = pagination.map_err(query_error)?;
    let page = EventService::past(&state.repos, pagination).await?;
    Ok(Json(PaginatedResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/events/featured",
    responses((status = 200, description = "Featured events", body = ApiResponse<Vec<Event>>)),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_featured_events(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let events = EventService::featured(&state.repos).await?;
    Ok(Json(ApiResponse::ok(events)))
}

#[utoipa::path(
    get,
    path = "/api/events/type/{event_type}",
    params(("event_type" = EventType, Path, description = "Event type")),
    responses(
        (status = 200, description = "Active events of the type", body = ApiResponse<Vec<Event>>),
        (status = 400, description = "Unknown event type")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_events_by_type(
    State(state): State<AppState>,
    Path(event_type): Path<EventType>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let events = EventService::list_by_type(&state.repos, event_type).await?;
    Ok(Json(ApiResponse::ok(events)))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event with creator and participants", body = ApiResponse<EventDetails>),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Json<ApiResponse<EventDetails>>, AppError> {
    let event = EventService::get_event(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(event)))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventDto,
    responses(
        (status = 200, description = "Event updated successfully", body = ApiResponse<Event>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<EventId>,
    ValidatedJson(dto): ValidatedJson<UpdateEventDto>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event = EventService::update_event(&state.repos, &state.image_cleanup, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Event updated successfully", event)))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted successfully", body = MessageResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<EventId>,
) -> Result<Json<MessageResponse>, AppError> {
    EventService::delete_event(&state.repos, &state.image_cleanup, id).await?;
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/register",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registered for event successfully", body = ApiResponse<Event>),
        (status = 400, description = "Event ended, full, or already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn register_for_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event = EventService::register(&state.repos, id, auth_user.id()).await?;
    Ok(Json(ApiResponse::with_message(
        "Registered for event successfully",
        event,
    )))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/unregister",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Unregistered from event successfully", body = ApiResponse<Event>),
        (status = 400, description = "Not registered for this event"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn unregister_from_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event = EventService::unregister(&state.repos, id, auth_user.id()).await?;
    Ok(Json(ApiResponse::with_message(
        "Unregistered from event successfully",
        event,
    )))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/registration",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Caller's registration status", body = ApiResponse<RegistrationStatus>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_registration_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<ApiResponse<RegistrationStatus>>, AppError> {
    let status = EventService::registration_status(&state.repos, id, auth_user.id()).await?;
    Ok(Json(ApiResponse::ok(status)))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/images",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = AddGalleryImageDto,
    responses(
        (status = 200, description = "Image added to the gallery", body = ApiResponse<Event>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn add_event_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<EventId>,
    ValidatedJson(dto): ValidatedJson<AddGalleryImageDto>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event = EventService::add_gallery_image(&state.repos, id, dto).await?;
    Ok(Json(ApiResponse::with_message("Image uploaded successfully", event)))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}/images/{public_id}",
    params(
        ("id" = Uuid, Path, description = "Event ID"),
        ("public_id" = String, Path, description = "Remote image identifier")
    ),
    responses(
        (status = 200, description = "Image removed", body = ApiResponse<Event>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Event or image not found")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_event_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, public_id)): Path<(EventId, String)>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event =
        EventService::remove_gallery_image(&state.repos, &state.image_cleanup, id, &public_id)
            .await?;
    Ok(Json(ApiResponse::with_message("Image removed successfully", event)))
}
