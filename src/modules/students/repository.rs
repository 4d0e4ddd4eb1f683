use async_trait::async_trait;
use collegium_core::{AppError, Paginated, PaginationParams};
use collegium_models::students::{
    Achievement, MAX_SEMESTER, OUTSTANDING_GPA_THRESHOLD, Student, StudentFilterParams,
};
use collegium_models::{BranchId, CourseId, StudentId, UserId};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;

/// Result of a conditional semester increment.
#[derive(Debug, Clone)]
pub enum PromotionOutcome {
    Promoted(Student),
    /// Already in the last semester; nothing was written.
    FinalSemester,
    NotFound,
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError>;
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Student>, AppError>;
    async fn list(&self, filters: &StudentFilterParams) -> Result<Paginated<Student>, AppError>;
    /// Flagged students, best GPA first.
    async fn list_outstanding(
        &self,
        pagination: &PaginationParams,
    ) -> Result<Paginated<Student>, AppError>;
    async fn list_by_semester(
        &self,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError>;
    /// `current_semester` is written only when `semester` is given, so an
    /// edit does not undo a concurrent promotion.
    async fn update(&self, student: &Student, semester: Option<i32>)
    -> Result<Student, AppError>;
    /// Writes `gpa` and the derived `is_outstanding` flag together.
    async fn set_gpa(&self, id: StudentId, gpa: f64) -> Result<Option<Student>, AppError>;
    async fn set_attendance(
        &self,
        id: StudentId,
        attendance: f64,
    ) -> Result<Option<Student>, AppError>;
    async fn promote(&self, id: StudentId) -> Result<PromotionOutcome, AppError>;
    async fn add_achievement(
        &self,
        id: StudentId,
        achievement: Achievement,
    ) -> Result<Option<Student>, AppError>;
    async fn top_performers(
        &self,
        limit: i64,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError>;
    /// Set semantics: enrolling twice keeps one entry.
    async fn enroll_course(
        &self,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Student>, AppError>;
    async fn unenroll_course(
        &self,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Student>, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &StudentFilterParams) {
    query.push(" FROM students s JOIN users u ON u.id = s.user_id WHERE TRUE");
    if let Some(branch_id) = filters.branch_id {
        query.push(" AND u.branch_id = ").push_bind(branch_id);
    }
    if let Some(semester) = filters.semester {
        query.push(" AND s.current_semester = ").push_bind(semester);
    }
    if let Some(is_outstanding) = filters.is_outstanding {
        query.push(" AND s.is_outstanding = ").push_bind(is_outstanding);
    }
}

#[async_trait]
impl StudentRepository for PgStore {
    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(student)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(student)
    }

    async fn list(&self, filters: &StudentFilterParams) -> Result<Paginated<Student>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT s.*");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY s.created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let students = query
            .build_query_as::<Student>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paginated::new(students, total, &filters.pagination))
    }

    async fn list_outstanding(
        &self,
        pagination: &PaginationParams,
    ) -> Result<Paginated<Student>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE is_outstanding",
        )
        .fetch_one(self.pool())
        .await?;

        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students WHERE is_outstanding
            ORDER BY gpa DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await?;

        Ok(Paginated::new(students, total, pagination))
    }

    async fn list_by_semester(
        &self,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT s.* FROM students s JOIN users u ON u.id = s.user_id
            WHERE s.current_semester = $1 AND ($2::uuid IS NULL OR u.branch_id = $2)
            ORDER BY s.roll_number
            "#,
        )
        .bind(semester)
        .bind(branch_id)
        .fetch_all(self.pool())
        .await?;
        Ok(students)
    }

    async fn update(
        &self,
        student: &Student,
        semester: Option<i32>,
    ) -> Result<Student, AppError> {
        let updated = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET roll_number = $2, current_semester = COALESCE($3, current_semester),
                guardian_name = $4,
                guardian_contact = $5, qualification = $6, heard_about_us = $7,
                blood_group = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(student.id)
        .bind(&student.roll_number)
        .bind(semester)
        .bind(&student.guardian_name)
        .bind(&student.guardian_contact)
        .bind(&student.qualification)
        .bind(&student.heard_about_us)
        .bind(&student.blood_group)
        .fetch_one(self.pool())
        .await?;
        Ok(updated)
    }

    async fn set_gpa(&self, id: StudentId, gpa: f64) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET gpa = $2, is_outstanding = $2 >= $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(gpa)
        .bind(OUTSTANDING_GPA_THRESHOLD)
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }

    async fn set_attendance(
        &self,
        id: StudentId,
        attendance: f64,
    ) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            "UPDATE students SET attendance = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(attendance)
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }

    async fn promote(&self, id: StudentId) -> Result<PromotionOutcome, AppError> {
        let promoted = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET current_semester = current_semester + 1, updated_at = NOW()
            WHERE id = $1 AND current_semester < $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(MAX_SEMESTER)
        .fetch_optional(self.pool())
        .await?;

        if let Some(student) = promoted {
            return Ok(PromotionOutcome::Promoted(student));
        }
        Ok(match self.find_by_id(id).await? {
            Some(_) => PromotionOutcome::FinalSemester,
            None => PromotionOutcome::NotFound,
        })
    }

    async fn add_achievement(
        &self,
        id: StudentId,
        achievement: Achievement,
    ) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET achievements = achievements || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(vec![achievement]))
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }

    async fn top_performers(
        &self,
        limit: i64,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT s.* FROM students s JOIN users u ON u.id = s.user_id
            WHERE $2::uuid IS NULL OR u.branch_id = $2
            ORDER BY s.gpa DESC, s.created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(branch_id)
        .fetch_all(self.pool())
        .await?;
        Ok(students)
    }

    async fn enroll_course(
        &self,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET enrolled_course_ids = CASE
                    WHEN $2 = ANY(enrolled_course_ids) THEN enrolled_course_ids
                    ELSE array_append(enrolled_course_ids, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(course_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }

    async fn unenroll_course(
        &self,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET enrolled_course_ids = array_remove(enrolled_course_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(course_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::{Tables, newest_first};
    use anyhow::anyhow;
    use chrono::Utc;

    fn in_branch(tables: &Tables, student: &Student, branch_id: Option<BranchId>) -> bool {
        match branch_id {
            None => true,
            Some(branch_id) => tables
                .users
                .iter()
                .any(|u| u.id == student.user_id && u.branch_id == Some(branch_id)),
        }
    }

    fn by_gpa_desc(rows: &mut [Student]) {
        rows.sort_by(|a, b| b.gpa.total_cmp(&a.gpa));
    }

    impl MemoryStore {
        fn with_student(
            &self,
            id: StudentId,
            change: impl FnOnce(&mut Student),
        ) -> Option<Student> {
            let mut tables = self.lock();
            tables.students.iter_mut().find(|s| s.id == id).map(|s| {
                change(s);
                s.updated_at = Utc::now();
                s.clone()
            })
        }
    }

    #[async_trait]
    impl StudentRepository for MemoryStore {
        async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError> {
            Ok(self.lock().students.iter().find(|s| s.id == id).cloned())
        }

        async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Student>, AppError> {
            Ok(self
                .lock()
                .students
                .iter()
                .find(|s| s.user_id == user_id)
                .cloned())
        }

        async fn list(&self, filters: &StudentFilterParams) -> Result<Paginated<Student>, AppError> {
            let tables = self.lock();
            let rows = newest_first(
                &tables.students,
                |s| s.created_at,
                |s| {
                    in_branch(&tables, s, filters.branch_id)
                        && filters.semester.is_none_or(|sem| s.current_semester == sem)
                        && filters.is_outstanding.is_none_or(|o| s.is_outstanding == o)
                },
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn list_outstanding(
            &self,
            pagination: &PaginationParams,
        ) -> Result<Paginated<Student>, AppError> {
            let mut rows = newest_first(&self.lock().students, |s| s.created_at, |s| s.is_outstanding);
            by_gpa_desc(&mut rows);
            Ok(Paginated::from_vec(rows, pagination))
        }

        async fn list_by_semester(
            &self,
            semester: i32,
            branch_id: Option<BranchId>,
        ) -> Result<Vec<Student>, AppError> {
            let tables = self.lock();
            let mut rows: Vec<Student> = tables
                .students
                .iter()
                .filter(|s| s.current_semester == semester && in_branch(&tables, s, branch_id))
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.roll_number.cmp(&b.roll_number));
            Ok(rows)
        }

        async fn update(
            &self,
            student: &Student,
            semester: Option<i32>,
        ) -> Result<Student, AppError> {
            let update = student.clone();
            self.with_student(student.id, move |s| {
                s.roll_number = update.roll_number;
                if let Some(semester) = semester {
                    s.current_semester = semester;
                }
                s.guardian_name = update.guardian_name;
                s.guardian_contact = update.guardian_contact;
                s.qualification = update.qualification;
                s.heard_about_us = update.heard_about_us;
                s.blood_group = update.blood_group;
            })
            .ok_or_else(|| AppError::not_found(anyhow!("Student not found")))
        }

        async fn set_gpa(&self, id: StudentId, gpa: f64) -> Result<Option<Student>, AppError> {
            Ok(self.with_student(id, |s| {
                s.gpa = gpa;
                s.is_outstanding = gpa >= OUTSTANDING_GPA_THRESHOLD;
            }))
        }

        async fn set_attendance(
            &self,
            id: StudentId,
            attendance: f64,
        ) -> Result<Option<Student>, AppError> {
            Ok(self.with_student(id, |s| s.attendance = attendance))
        }

        async fn promote(&self, id: StudentId) -> Result<PromotionOutcome, AppError> {
            let mut tables = self.lock();
            let Some(student) = tables.students.iter_mut().find(|s| s.id == id) else {
                return Ok(PromotionOutcome::NotFound);
            };
            if student.current_semester >= MAX_SEMESTER {
                return Ok(PromotionOutcome::FinalSemester);
            }
            student.current_semester += 1;
            student.updated_at = Utc::now();
            Ok(PromotionOutcome::Promoted(student.clone()))
        }

        async fn add_achievement(
            &self,
            id: StudentId,
            achievement: Achievement,
        ) -> Result<Option<Student>, AppError> {
            Ok(self.with_student(id, |s| s.achievements.0.push(achievement)))
        }

        async fn top_performers(
            &self,
            limit: i64,
            branch_id: Option<BranchId>,
        ) -> Result<Vec<Student>, AppError> {
            let tables = self.lock();
            let mut rows: Vec<Student> = tables
                .students
                .iter()
                .filter(|s| in_branch(&tables, s, branch_id))
                .cloned()
                .collect();
            by_gpa_desc(&mut rows);
            rows.truncate(limit.max(0) as usize);
            Ok(rows)
        }

        async fn enroll_course(
            &self,
            id: StudentId,
            course_id: CourseId,
        ) -> Result<Option<Student>, AppError> {
            Ok(self.with_student(id, |s| {
                if !s.enrolled_course_ids.contains(&course_id) {
                    s.enrolled_course_ids.push(course_id);
                }
            }))
        }

        async fn unenroll_course(
            &self,
            id: StudentId,
            course_id: CourseId,
        ) -> Result<Option<Student>, AppError> {
            Ok(self.with_student(id, |s| s.enrolled_course_ids.retain(|c| *c != course_id)))
        }
    }
}
