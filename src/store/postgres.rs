//! PostgreSQL backend shared by every repository implementation.

use anyhow::anyhow;
use collegium_core::AppError;
use sqlx::PgPool;
use tracing::{error, warn};

use crate::utils::profile_number::ProfileNumberTaken;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique-constraint violation to a 400 with `message`; anything
/// else is a database failure.
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        warn!(constraint = ?db_err.constraint(), "{}", message);
        return AppError::bad_request(anyhow!(message.to_string()));
    }
    error!(error = %err, "database error");
    AppError::database(err)
}

/// Like [`unique_violation`], but a hit on `constraint` is reported as a
/// [`ProfileNumberTaken`] so the caller can retry with a fresh number.
pub(crate) fn profile_number_violation(
    err: sqlx::Error,
    constraint: &str,
    message: &'static str,
) -> AppError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(constraint)
    {
        warn!(constraint, "{}", message);
        return ProfileNumberTaken(message).into();
    }
    unique_violation(err, message)
}

/// `%term%` for ILIKE searches.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}
