use std::env;

use crate::env_or;

/// Token signing configuration.
///
/// Access tokens live 7 days and refresh tokens 30 days unless overridden.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());
        Self {
            refresh_secret: env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| format!("{}-refresh", secret)),
            secret,
            access_token_expiry: env_or("JWT_ACCESS_EXPIRY", 7 * 24 * 60 * 60),
            refresh_token_expiry: env_or("JWT_REFRESH_EXPIRY", 30 * 24 * 60 * 60),
        }
    }
}
