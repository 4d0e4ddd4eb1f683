//! # Collegium Auth
//!
//! JWT claim structures and token utilities.
//!
//! - **Access token** ([`Claims`]): `{sub: userId, role}`, 7 days by default
//! - **Refresh token** ([`RefreshTokenClaims`]): `{sub: userId, jti}`, 30 days by default,
//!   signed with a separate secret so one can never be used as the other
//!
//! # Example
//!
//! ```ignore
//! use collegium_auth::{create_access_token, verify_token};
//! use collegium_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "student", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, "student");
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims, TokenPair};
pub use jwt::{
    create_access_token, create_refresh_token, issue_token_pair, verify_refresh_token,
    verify_token,
};
