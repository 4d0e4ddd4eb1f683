use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use collegium_auth::{Claims, verify_token};
use collegium_core::AppError;
use collegium_models::{User, UserId, UserRole};

use crate::state::AppState;

/// Cookie carrying the access token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// The authenticated caller: verified claims plus the freshly loaded user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Not authorized, no token"))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        let user = state
            .repos
            .users
            .find_by_id(UserId::from_uuid(claims.sub))
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        if !user.is_active {
            return Err(AppError::unauthorized("Account is inactive"));
        }

        Ok(AuthUser { user, claims })
    }
}

/// `Option<AuthUser>`: `None` when no token is sent, still 401 for a bad one.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(None);
        }
        <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

/// Declares an extractor that only admits the listed roles.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $roles:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = collegium_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                $crate::middleware::role::authorize(&auth_user, $roles)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_role!(AdminUser, crate::middleware::role::ADMIN_ROLES);
require_role!(FacultyUser, crate::middleware::role::FACULTY_ROLES);
require_role!(StudentUser, crate::middleware::role::STUDENT_ROLES);
