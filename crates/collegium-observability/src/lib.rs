//! Collegium Observability
//!
//! - Tracing subscriber set-up: console, optional JSON lines, optional daily
//!   rolling files and an optional OpenTelemetry exporter
//! - HTTP request logging middleware
//! - Prometheus metrics: request middleware, `/metrics` router and domain counters
//!
//! Compiled in through the `observability` feature (default). At runtime,
//! metrics are switched off with `OBSERVABILITY_ENABLED=false`.
//!
//! ```no_run
//! use collegium_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     // ... application code ...
//!     shutdown_tracer().await;
//! }
//! ```

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, is_observability_enabled, metrics_app, metrics_middleware,
    track_image_deletion, track_jwt_issued, track_login, track_pending_image_deletions,
    track_user_registered,
};

#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    /// Stand-in for the Prometheus handle.
    #[derive(Clone, Debug)]
    pub struct PrometheusHandle;

    pub fn is_observability_enabled() -> bool {
        false
    }

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    /// Console-only logging.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("collegium=info,tower_http=warn,sqlx=warn"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init();
    }

    pub async fn shutdown_tracer() {}

    pub fn init_metrics() -> Option<PrometheusHandle> {
        None
    }

    pub fn metrics_app(_handle: PrometheusHandle) -> Router {
        Router::new()
    }

    pub fn track_user_registered(_role: &str) {}
    pub fn track_login(_outcome: &str) {}
    pub fn track_jwt_issued() {}
    pub fn track_image_deletion(_outcome: &str) {}
    pub fn track_pending_image_deletions(_count: usize) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
