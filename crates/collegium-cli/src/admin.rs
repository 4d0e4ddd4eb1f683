//! Admin account bootstrap.

use chrono::Utc;
use collegium_core::hash_password;
use collegium_models::admins::{DEFAULT_DEPARTMENT, default_permissions};
use collegium_models::ids::{ADMIN_NUMBER_PREFIX, profile_number};
use collegium_models::users::UserRole;
use collegium_models::{AdminId, UserId};
use collegium_models::validation::normalize_email;
use sqlx::PgPool;

pub struct NewAdminAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub department: Option<&'a str>,
    pub super_admin: bool,
}

/// Creates an admin user together with its admin profile.
///
/// Admins never belong to a branch. Fails when the email is taken.
pub async fn create_admin(
    db: &PgPool,
    account: NewAdminAccount<'_>,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let email = normalize_email(account.email);
    let password_hash = hash_password(account.password)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
            .bind(&email)
            .fetch_one(&mut *tx)
            .await?;
    if taken {
        tx.rollback().await?;
        return Err("User with this email already exists".into());
    }

    let user_id = UserId::new();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, branch_id)
         VALUES ($1, $2, $3, $4, $5, NULL)",
    )
    .bind(user_id)
    .bind(account.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO admins (id, user_id, admin_id, department, permissions, is_super_admin)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(AdminId::new())
    .bind(user_id)
    .bind(profile_number(ADMIN_NUMBER_PREFIX, Utc::now()))
    .bind(account.department.unwrap_or(DEFAULT_DEPARTMENT))
    .bind(default_permissions())
    .bind(account.super_admin)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}
