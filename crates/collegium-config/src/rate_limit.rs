//! Rate limiting configuration for API endpoints.
//!
//! - `RATE_LIMIT_ENABLED`: set to `false` to disable limiting (default: true)
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: replenish interval for general endpoints (default: 2)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: burst size for general endpoints (default: 30)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: replenish interval for auth endpoints (default: 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: burst size for auth endpoints (default: 5)
//!
//! Buckets are keyed by client IP, taken from `x-forwarded-for` /
//! `x-real-ip` / `forwarded` headers before falling back to the peer address.

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::env_or;

pub type IpGovernorConfig =
    GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Seconds per replenished token for general endpoints.
    pub general_per_second: u64,

    /// Maximum tokens that can accumulate for general endpoints.
    pub general_burst_size: u32,

    /// Seconds per replenished token for auth endpoints.
    pub auth_per_second: u64,

    /// Lower burst size for auth endpoints against credential stuffing.
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", 2),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", 30),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", 10),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", 5),
        }
    }

    /// A configuration with limiting switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Governor config for general API endpoints, `None` for invalid (zero) values.
    #[must_use]
    pub fn general_governor_config(&self) -> Option<IpGovernorConfig> {
        GovernorConfigBuilder::default()
            .per_second(self.general_per_second)
            .burst_size(self.general_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }

    /// Governor config for authentication endpoints.
    #[must_use]
    pub fn auth_governor_config(&self) -> Option<IpGovernorConfig> {
        GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }
}
