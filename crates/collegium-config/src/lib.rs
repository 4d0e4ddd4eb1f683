//! # Collegium Config
//!
//! Configuration types for the Collegium API, loaded from environment variables:
//!
//! - [`jwt`]: token signing secrets and lifetimes
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: request rate limits
//! - [`storage`]: image storage backend selection and credentials
//! - [`server`]: bind address and background job intervals
//!
//! # Example
//!
//! ```ignore
//! use collegium_config::{JwtConfig, CorsConfig, RateLimitConfig, ServerConfig, StorageConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let storage_config = StorageConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
