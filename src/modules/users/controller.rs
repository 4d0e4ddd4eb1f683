use axum::{
    Json,
    extract::{Path, State},
};
use collegium_core::{ApiResponse, AppError};
use collegium_models::profile::UserProfile;
use collegium_models::users::UserStatusDto;
use collegium_models::{User, UserId};
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Activate or deactivate an account
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserStatusDto,
    responses(
        (status = 200, description = "User status updated", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn set_user_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UserStatusDto>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = UserService::set_user_status(&state.repos, id, dto.is_active).await?;
    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(Json(ApiResponse::with_message(message, user)))
}

/// Any user's profile with its role details
#[utoipa::path(
    get,
    path = "/api/users/{id}/profile",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_user_profile(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let profile = UserService::get_user_profile(&state.repos, id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
