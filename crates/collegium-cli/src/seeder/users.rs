//! Faculty and student seeding.
//!
//! Each seeded account gets its `users` row plus the matching sub-profile,
//! inserted in one transaction so a failed run leaves nothing half-created.

use chrono::{Datelike, Utc};
use collegium_models::ids::{FACULTY_NUMBER_PREFIX, STUDENT_NUMBER_PREFIX};
use collegium_models::students::{MAX_SEMESTER, MIN_SEMESTER, OUTSTANDING_GPA_THRESHOLD};
use collegium_models::{BranchId, FacultyId, StudentId, UserId, UserRole};
use fake::Fake;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Instant;

use super::models::{FacultySeed, SEED_EMAIL_DOMAIN, StudentSeed, UserSeed};

const SPECIALIZATIONS: [&str; 6] = [
    "Mathematics",
    "Computer Science",
    "Physics",
    "Commerce",
    "English",
    "Management",
];

const QUALIFICATIONS: [&str; 3] = ["M.Sc", "M.Tech", "PhD"];

fn generate_user(
    role: UserRole,
    branch_id: BranchId,
    group_idx: usize,
    user_idx: usize,
    password_hash: &str,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    let email = format!(
        "{}.{}+{}{}@{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        role,
        group_idx * 10_000 + user_idx,
        SEED_EMAIL_DOMAIN
    );

    UserSeed {
        id: UserId::new(),
        name: format!("{} {}", first_name, last_name),
        email,
        password_hash: password_hash.to_string(),
        role,
        phone: PhoneNumber().fake(),
        branch_id: Some(branch_id),
    }
}

/// Generates faculty accounts and their profiles for every branch
pub fn generate_faculty(
    branch_ids: &[BranchId],
    per_branch: usize,
    password_hash: &str,
) -> Vec<(UserSeed, FacultySeed)> {
    let stamp = Utc::now().timestamp_millis();
    branch_ids
        .par_iter()
        .enumerate()
        .flat_map(|(branch_idx, &branch_id)| {
            (0..per_branch)
                .map(|idx| {
                    let user =
                        generate_user(UserRole::Faculty, branch_id, branch_idx, idx, password_hash);
                    let profile = FacultySeed {
                        user_id: user.id,
                        employee_id: format!(
                            "{}{}{:05}",
                            FACULTY_NUMBER_PREFIX,
                            stamp,
                            branch_idx * per_branch + idx
                        ),
                        name: user.name.clone(),
                        email: user.email.clone(),
                        specialization: SPECIALIZATIONS[idx % SPECIALIZATIONS.len()].to_string(),
                        qualification: QUALIFICATIONS[idx % QUALIFICATIONS.len()].to_string(),
                        experience: (0..30).fake(),
                    };
                    (user, profile)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Generates student accounts and their profiles for every branch
pub fn generate_students(
    branch_ids: &[BranchId],
    per_branch: usize,
    password_hash: &str,
) -> Vec<(UserSeed, StudentSeed)> {
    let now = Utc::now();
    let stamp = now.timestamp_millis();
    let year = now.year();
    branch_ids
        .par_iter()
        .enumerate()
        .flat_map(|(branch_idx, &branch_id)| {
            (0..per_branch)
                .map(|idx| {
                    let user =
                        generate_user(UserRole::Student, branch_id, branch_idx, idx, password_hash);
                    let semester: i32 = (MIN_SEMESTER..=MAX_SEMESTER).fake();
                    let gpa = ((5.0..10.0).fake::<f64>() * 100.0).round() / 100.0;
                    let profile = StudentSeed {
                        user_id: user.id,
                        student_id: format!(
                            "{}{}{:05}",
                            STUDENT_NUMBER_PREFIX,
                            stamp,
                            branch_idx * per_branch + idx
                        ),
                        roll_number: format!("{}{}", year, (0..=9999).fake::<u32>()),
                        admission_year: year - (semester - 1) / 2,
                        current_semester: semester,
                        gpa,
                        attendance: ((50.0..100.0).fake::<f64>() * 10.0).round() / 10.0,
                        guardian_name: Name().fake(),
                        guardian_contact: PhoneNumber().fake(),
                    };
                    (user, profile)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_faculty(
    db: &PgPool,
    branch_ids: &[BranchId],
    per_branch: usize,
    password_hash: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "👩‍🏫 Seeding {} faculty ({} per branch)...",
        branch_ids.len() * per_branch,
        per_branch
    );

    let rows = generate_faculty(branch_ids, per_branch, password_hash);
    let mut tx = db.begin().await?;
    for chunk in rows.chunks(BATCH_SIZE) {
        let users: Vec<&UserSeed> = chunk.iter().map(|(u, _)| u).collect();
        insert_users_chunk(&mut tx, &users).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO faculty (id, user_id, employee_id, name, email, specialization, \
             qualification, experience) ",
        );
        query.push_values(chunk, |mut row, (_, faculty)| {
            row.push_bind(FacultyId::new())
                .push_bind(faculty.user_id)
                .push_bind(&faculty.employee_id)
                .push_bind(&faculty.name)
                .push_bind(&faculty.email)
                .push_bind(&faculty.specialization)
                .push_bind(&faculty.qualification)
                .push_bind(faculty.experience);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} faculty in {:?}",
        rows.len(),
        start_time.elapsed()
    );
    Ok(rows.len())
}

pub async fn seed_students(
    db: &PgPool,
    branch_ids: &[BranchId],
    per_branch: usize,
    password_hash: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "🎓 Seeding {} students ({} per branch)...",
        branch_ids.len() * per_branch,
        per_branch
    );

    let rows = generate_students(branch_ids, per_branch, password_hash);
    let mut tx = db.begin().await?;
    for chunk in rows.chunks(BATCH_SIZE) {
        let users: Vec<&UserSeed> = chunk.iter().map(|(u, _)| u).collect();
        insert_users_chunk(&mut tx, &users).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO students (id, user_id, student_id, roll_number, admission_year, \
             current_semester, gpa, attendance, guardian_name, guardian_contact, is_outstanding) ",
        );
        query.push_values(chunk, |mut row, (_, student)| {
            row.push_bind(StudentId::new())
                .push_bind(student.user_id)
                .push_bind(&student.student_id)
                .push_bind(&student.roll_number)
                .push_bind(student.admission_year)
                .push_bind(student.current_semester)
                .push_bind(student.gpa)
                .push_bind(student.attendance)
                .push_bind(&student.guardian_name)
                .push_bind(&student.guardian_contact)
                .push_bind(student.gpa >= OUTSTANDING_GPA_THRESHOLD);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} students in {:?}",
        rows.len(),
        start_time.elapsed()
    );
    Ok(rows.len())
}

// 11 binds per student row keeps a chunk well under the 65535 bind limit
const BATCH_SIZE: usize = 1000;

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[&UserSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if users.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO users (id, name, email, password_hash, role, phone, branch_id) ",
    );
    query.push_values(users, |mut row, user| {
        row.push_bind(user.id)
            .push_bind(&user.name)
            .push_bind(&user.email)
            .push_bind(&user.password_hash)
            .push_bind(user.role)
            .push_bind(&user.phone)
            .push_bind(user.branch_id);
    });
    query.build().execute(&mut **tx).await?;
    Ok(())
}

/// Deletes seeded accounts; profiles and registrations cascade.
pub async fn clear_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded users...");

    let result = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(format!("%@{}", SEED_EMAIL_DOMAIN))
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} users in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}
