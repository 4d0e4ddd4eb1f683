//! Idempotent data bootstrap run at start-up and from the CLI.

use collegium_models::branches::NewBranch;
use collegium_models::ids::BranchId;
use sqlx::PgPool;
use uuid::Uuid;

/// Returns the first active branch, creating "General Studies" when none
/// exists. An inactive `GEN` branch is reactivated rather than duplicated.
pub async fn ensure_default_branch(pool: &PgPool) -> Result<BranchId, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, BranchId>(
        "SELECT id FROM branches WHERE is_active ORDER BY created_at LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let branch = NewBranch::general_studies();
    let id = sqlx::query_scalar::<_, BranchId>(
        r#"
        INSERT INTO branches (id, branch_name, branch_code, description, total_seats, available_seats)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (branch_code) DO UPDATE SET is_active = TRUE, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&branch.branch_name)
    .bind(&branch.branch_code)
    .bind(&branch.description)
    .bind(branch.total_seats)
    .bind(branch.available_seats)
    .fetch_one(pool)
    .await?;

    tracing::info!(branch_id = %id, "created default branch");
    Ok(id)
}
