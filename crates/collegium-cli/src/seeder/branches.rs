//! Branch seeding.

use collegium_models::BranchId;
use fake::Fake;
use fake::faker::address::en::*;
use fake::faker::lorem::en::Sentence;
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use super::models::{BranchSeed, SEED_BRANCH_PREFIX};

/// Generates branch rows in parallel using Rayon
pub fn generate_branches(count: usize) -> Vec<BranchSeed> {
    (0..count)
        .into_par_iter()
        .map(|_| {
            let id = BranchId::new();
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();
            let suffix = id.as_uuid().simple().to_string()[..6].to_uppercase();

            BranchSeed {
                id,
                branch_name: format!("{} Campus", city),
                branch_code: format!("{}{}", SEED_BRANCH_PREFIX, suffix),
                description: Sentence(6..12).fake(),
                address: format!("{} {}", building, street),
                city,
                state: StateName().fake(),
                pincode: ZipCode().fake(),
                contact_phone: PhoneNumber().fake(),
                total_seats: (60..240).fake(),
                established_year: (1970..2020).fake(),
            }
        })
        .collect()
}

pub async fn seed_branches(
    db: &PgPool,
    count: usize,
) -> Result<Vec<BranchId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} branches...", count);

    let branches = generate_branches(count);
    insert_branches_batch(db, &branches).await?;

    println!(
        "   ✓ Inserted {} branches in {:?}",
        branches.len(),
        start_time.elapsed()
    );

    Ok(branches.iter().map(|b| b.id).collect())
}

/// Inserts branches with multi-row INSERT statements inside one transaction
pub async fn insert_branches_batch(
    db: &PgPool,
    branches: &[BranchSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    // 12 binds per row
    const BATCH_SIZE: usize = 500;

    let mut tx = db.begin().await?;
    for chunk in branches.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO branches (id, branch_name, branch_code, description, address, city, \
             state, pincode, contact_phone, total_seats, available_seats, established_year) ",
        );
        query.push_values(chunk, |mut row, branch| {
            row.push_bind(branch.id)
                .push_bind(&branch.branch_name)
                .push_bind(&branch.branch_code)
                .push_bind(&branch.description)
                .push_bind(&branch.address)
                .push_bind(&branch.city)
                .push_bind(&branch.state)
                .push_bind(&branch.pincode)
                .push_bind(&branch.contact_phone)
                .push_bind(branch.total_seats)
                .push_bind(branch.total_seats)
                .push_bind(branch.established_year);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Removes seeded branches; their courses lose the branch reference.
pub async fn clear_branches(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded branches...");

    let result = sqlx::query("DELETE FROM branches WHERE branch_code LIKE $1")
        .bind(format!("{}%", SEED_BRANCH_PREFIX))
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} branches in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}
