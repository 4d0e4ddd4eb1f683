//! Course seeding.

use collegium_models::students::{MAX_SEMESTER, MIN_SEMESTER};
use collegium_models::{BranchId, CourseId};
use fake::Fake;
use fake::faker::lorem::en::{Sentence, Word};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use super::models::{CourseSeed, SEED_BRANCH_PREFIX};

const SUBJECTS: [&str; 10] = [
    "Mathematics",
    "Physics",
    "Chemistry",
    "Computer Science",
    "Economics",
    "Accounting",
    "Biology",
    "Statistics",
    "Literature",
    "Design",
];

/// Generates `per_branch` courses for every branch, spread across semesters
pub fn generate_courses(branch_ids: &[BranchId], per_branch: usize) -> Vec<CourseSeed> {
    branch_ids
        .par_iter()
        .enumerate()
        .flat_map(|(branch_idx, &branch_id)| {
            (0..per_branch)
                .map(|course_idx| {
                    let subject = SUBJECTS[(branch_idx + course_idx) % SUBJECTS.len()];
                    let topic: String = Word().fake();
                    let semester =
                        MIN_SEMESTER + (course_idx as i32 % (MAX_SEMESTER - MIN_SEMESTER + 1));
                    let id = CourseId::new();
                    CourseSeed {
                        id,
                        course_name: format!("{} {}", subject, capitalize(&topic)),
                        course_code: format!(
                            "{}C{}",
                            SEED_BRANCH_PREFIX,
                            id.as_uuid().simple().to_string()[..8].to_uppercase()
                        ),
                        description: Sentence(8..16).fake(),
                        duration: format!("{} months", (3..=12).fake::<u8>()),
                        branch_id,
                        credits: (1..=5).fake(),
                        semester,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn seed_courses(
    db: &PgPool,
    branch_ids: &[BranchId],
    per_branch: usize,
) -> Result<Vec<CourseId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "📚 Seeding {} courses ({} per branch)...",
        branch_ids.len() * per_branch,
        per_branch
    );

    let courses = generate_courses(branch_ids, per_branch);
    insert_courses_batch(db, &courses).await?;

    println!(
        "   ✓ Inserted {} courses in {:?}",
        courses.len(),
        start_time.elapsed()
    );

    Ok(courses.iter().map(|c| c.id).collect())
}

pub async fn insert_courses_batch(
    db: &PgPool,
    courses: &[CourseSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    // 8 binds per row
    const BATCH_SIZE: usize = 1000;

    let mut tx = db.begin().await?;
    for chunk in courses.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO courses (id, course_name, course_code, description, duration, \
             branch_id, credits, semester) ",
        );
        query.push_values(chunk, |mut row, course| {
            row.push_bind(course.id)
                .push_bind(&course.course_name)
                .push_bind(&course.course_code)
                .push_bind(&course.description)
                .push_bind(&course.duration)
                .push_bind(course.branch_id)
                .push_bind(course.credits)
                .push_bind(course.semester);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn clear_courses(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded courses...");

    let result = sqlx::query("DELETE FROM courses WHERE course_code LIKE $1")
        .bind(format!("{}C%", SEED_BRANCH_PREFIX))
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} courses in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courses_cover_valid_semesters() {
        let branches = vec![BranchId::new(), BranchId::new()];
        let courses = generate_courses(&branches, 10);
        assert_eq!(courses.len(), 20);
        assert!(
            courses
                .iter()
                .all(|c| (MIN_SEMESTER..=MAX_SEMESTER).contains(&c.semester))
        );
        assert!(courses.iter().all(|c| (1..=5).contains(&c.credits)));
    }

    #[test]
    fn test_course_codes_are_unique_per_run() {
        let branches = vec![BranchId::new(), BranchId::new(), BranchId::new()];
        let courses = generate_courses(&branches, 5);
        let mut codes: Vec<_> = courses.iter().map(|c| c.course_code.clone()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 15);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("algebra"), "Algebra");
        assert_eq!(capitalize(""), "");
    }
}
