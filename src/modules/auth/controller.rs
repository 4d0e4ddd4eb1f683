use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use collegium_auth::TokenPair;
use collegium_core::{ApiResponse, AppError, MessageResponse};
use collegium_models::User;
use collegium_models::auth::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};
use collegium_models::profile::UserProfile;
use collegium_models::users::{ChangePasswordDto, UpdateProfileDto};
use tracing::instrument;

use crate::middleware::auth::{AuthUser, TOKEN_COOKIE};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AuthService;

fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a user together with its role profile
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error, email taken or no branch available"),
        (status = 403, description = "Admin registration not allowed")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, caller, dto))]
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let response =
        AuthService::register(&state.repos, &state.jwt_config, caller.as_ref(), dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            response,
        )),
    ))
}

/// Log in and receive a token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), AppError> {
    let response = AuthService::login(&state.repos, &state.jwt_config, dto).await?;
    let jar = jar.add(token_cookie(response.token.clone()));
    Ok((
        jar,
        Json(ApiResponse::with_message("Login successful", response)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let pair = AuthService::refresh(&state.repos, &state.jwt_config, dto).await?;
    Ok(Json(ApiResponse::ok(pair)))
}

/// Tokens are stateless, so logging out only clears the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out successfully", body = MessageResponse)),
    tag = "Authentication"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/")),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user with role details", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user.id = %auth_user.id()))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let profile = UserService::get_user_profile(&state.repos, auth_user.id()).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<User>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = AuthService::update_profile(&state.repos, auth_user.user, dto).await?;
    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        user,
    )))
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Current password is incorrect"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(&state.repos, &auth_user.user, dto).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
