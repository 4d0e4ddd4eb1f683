use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Access token payload: the user and the role it was issued for.
///
/// The role is informational; guards reload the user and trust the stored
/// role over the claim.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub sub: Uuid,
    /// `admin`, `faculty` or `student`
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh token payload. Carries no role so a role change takes effect on
/// the next refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    /// Random per token, so two refreshes within one second still differ.
    pub jti: String,
}

/// Tokens returned by login, registration and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}
