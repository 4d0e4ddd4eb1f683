//! Fake data for local development.
//!
//! Seeded rows are tagged (branch codes starting with `SD`, emails under
//! `seed.collegium.test`) so [`clear_all`] removes them without touching real
//! data. Every seeded account uses the password in [`SEED_PASSWORD`].

pub mod branches;
pub mod courses;
pub mod models;
pub mod users;

use collegium_core::hash_password;
use sqlx::PgPool;
use std::time::Instant;

pub use models::{PerBranch, SEED_PASSWORD, SeedConfig};

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "🌱 Seeding {} branches with {} accounts...\n",
        config.num_branches,
        config.total_users()
    );

    let password_hash = hash_password(SEED_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let branch_ids = branches::seed_branches(db, config.num_branches).await?;
    courses::seed_courses(db, &branch_ids, config.per_branch.courses).await?;
    users::seed_faculty(db, &branch_ids, config.per_branch.faculty, &password_hash).await?;
    users::seed_students(db, &branch_ids, config.per_branch.students, &password_hash).await?;

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   Seeded accounts log in with password `{}`", SEED_PASSWORD);
    Ok(())
}

/// Removes everything [`seed_all`] created, users first.
pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    users::clear_users(db).await?;
    courses::clear_courses(db).await?;
    branches::clear_branches(db).await?;

    println!("\n✅ Cleared seeded data in {:?}", start_time.elapsed());
    Ok(())
}
