//! # Collegium DB
//!
//! PostgreSQL connection pool and embedded migrations.
//!
//! - `DATABASE_URL`: connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//!
//! [`ensure_default_branch`] is the start-up bootstrap that guarantees at
//! least one active branch for registrations without an explicit branch.
//!
//! # Example
//!
//! ```ignore
//! use collegium_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool().await?;
//! run_migrations(&pool).await?;
//! ```

pub mod bootstrap;

use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;

pub use bootstrap::ensure_default_branch;
pub use sqlx::PgPool;

/// Migrations under the workspace `migrations/` directory, compiled in.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug)]
pub enum DbInitError {
    MissingUrl,
    Connect(sqlx::Error),
}

impl std::fmt::Display for DbInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "DATABASE_URL must be set"),
            Self::Connect(e) => write!(f, "Failed to connect to database: {}", e),
        }
    }
}

impl std::error::Error for DbInitError {}

/// Opens a PostgreSQL connection pool from `DATABASE_URL`.
pub async fn init_db_pool() -> Result<PgPool, DbInitError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbInitError::MissingUrl)?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .map_err(DbInitError::Connect)?;

    tracing::info!(max_connections, "database pool initialised");
    Ok(pool)
}

/// Applies any pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}
