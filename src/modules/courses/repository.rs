use async_trait::async_trait;
use collegium_core::{AppError, Paginated};
use collegium_models::courses::{Course, CourseFilterParams, NewCourse};
use collegium_models::{BranchId, CourseId, UserId};
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;
use crate::store::postgres::{like_pattern, unique_violation};

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: NewCourse) -> Result<Course, AppError>;
    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Course>, AppError>;
    /// Courses among `ids` that exist; unknown ids are skipped.
    async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, AppError>;
    async fn list(&self, filters: &CourseFilterParams) -> Result<Paginated<Course>, AppError>;
    async fn list_by_branch(&self, branch_id: BranchId) -> Result<Vec<Course>, AppError>;
    async fn list_by_semester(
        &self,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Course>, AppError>;
    async fn list_active(&self) -> Result<Vec<Course>, AppError>;
    async fn update(&self, course: &Course) -> Result<Course, AppError>;
    async fn delete(&self, id: CourseId) -> Result<bool, AppError>;
    async fn assign_faculty(
        &self,
        id: CourseId,
        faculty_user_id: UserId,
    ) -> Result<Option<Course>, AppError>;
    /// Set semantics: adding an existing prerequisite is a no-op.
    async fn add_prerequisite(
        &self,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Option<Course>, AppError>;
    async fn remove_prerequisite(
        &self,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Option<Course>, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &CourseFilterParams) {
    query.push(" WHERE TRUE");
    if let Some(branch_id) = filters.branch_id {
        query.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(semester) = filters.semester {
        query.push(" AND semester = ").push_bind(semester);
    }
    if let Some(is_active) = filters.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (course_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR course_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn create(&self, course: NewCourse) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, course_name, course_code, description, duration, branch_id,
                credits, semester, syllabus, prerequisites)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(CourseId::new())
        .bind(&course.course_name)
        .bind(&course.course_code)
        .bind(&course.description)
        .bind(&course.duration)
        .bind(course.branch_id)
        .bind(course.credits)
        .bind(course.semester)
        .bind(&course.syllabus)
        .bind(&course.prerequisites)
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, "Course code already exists"))
    }

    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(course)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE course_code = $1")
            .bind(code.trim().to_uppercase())
            .fetch_optional(self.pool())
            .await?;
        Ok(course)
    }

    async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = ANY($1) ORDER BY semester, course_code",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(courses)
    }

    async fn list(&self, filters: &CourseFilterParams) -> Result<Paginated<Course>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM courses");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let courses = query
            .build_query_as::<Course>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paginated::new(courses, total, &filters.pagination))
    }

    async fn list_by_branch(&self, branch_id: BranchId) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE branch_id = $1 AND is_active ORDER BY semester, course_code",
        )
        .bind(branch_id)
        .fetch_all(self.pool())
        .await?;
        Ok(courses)
    }

    async fn list_by_semester(
        &self,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE semester = $1 AND is_active AND ($2::uuid IS NULL OR branch_id = $2)
            ORDER BY course_code
            "#,
        )
        .bind(semester)
        .bind(branch_id)
        .fetch_all(self.pool())
        .await?;
        Ok(courses)
    }

    async fn list_active(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE is_active ORDER BY semester, course_code",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(courses)
    }

    async fn update(&self, course: &Course) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET course_name = $2, course_code = $3, description = $4, duration = $5,
                branch_id = $6, credits = $7, semester = $8, syllabus = $9, is_active = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(course.id)
        .bind(&course.course_name)
        .bind(&course.course_code)
        .bind(&course.description)
        .bind(&course.duration)
        .bind(course.branch_id)
        .bind(course.credits)
        .bind(course.semester)
        .bind(&course.syllabus)
        .bind(course.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, "Course code already exists"))
    }

    async fn delete(&self, id: CourseId) -> Result<bool, AppError> {
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        // Drop dangling references held in array columns.
        sqlx::query(
            "UPDATE courses SET prerequisites = array_remove(prerequisites, $1) WHERE $1 = ANY(prerequisites)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE students SET enrolled_course_ids = array_remove(enrolled_course_ids, $1) WHERE $1 = ANY(enrolled_course_ids)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE faculty SET course_ids = array_remove(course_ids, $1) WHERE $1 = ANY(course_ids)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_faculty(
        &self,
        id: CourseId,
        faculty_user_id: UserId,
    ) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET faculty_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(faculty_user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(course)
    }

    async fn add_prerequisite(
        &self,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET prerequisites = CASE
                    WHEN $2 = ANY(prerequisites) THEN prerequisites
                    ELSE array_append(prerequisites, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(prerequisite)
        .fetch_optional(self.pool())
        .await?;
        Ok(course)
    }

    async fn remove_prerequisite(
        &self,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET prerequisites = array_remove(prerequisites, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(prerequisite)
        .fetch_optional(self.pool())
        .await?;
        Ok(course)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::{matches_search, newest_first};
    use anyhow::anyhow;
    use chrono::Utc;

    fn by_semester_then_code(rows: &mut [Course]) {
        rows.sort_by(|a, b| {
            a.semester
                .cmp(&b.semester)
                .then_with(|| a.course_code.cmp(&b.course_code))
        });
    }

    #[async_trait]
    impl CourseRepository for MemoryStore {
        async fn create(&self, course: NewCourse) -> Result<Course, AppError> {
            let mut tables = self.lock();
            if tables
                .courses
                .iter()
                .any(|c| c.course_code == course.course_code)
            {
                return Err(AppError::bad_request(anyhow!("Course code already exists")));
            }
            let now = Utc::now();
            let created = Course {
                id: CourseId::new(),
                course_name: course.course_name,
                course_code: course.course_code,
                description: course.description,
                duration: course.duration,
                branch_id: course.branch_id,
                faculty_id: None,
                credits: course.credits,
                semester: course.semester,
                syllabus: course.syllabus,
                prerequisites: course.prerequisites,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            tables.courses.push(created.clone());
            Ok(created)
        }

        async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, AppError> {
            Ok(self.lock().courses.iter().find(|c| c.id == id).cloned())
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Course>, AppError> {
            let code = code.trim().to_uppercase();
            Ok(self
                .lock()
                .courses
                .iter()
                .find(|c| c.course_code == code)
                .cloned())
        }

        async fn find_many(&self, ids: &[CourseId]) -> Result<Vec<Course>, AppError> {
            let mut rows: Vec<Course> = self
                .lock()
                .courses
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect();
            by_semester_then_code(&mut rows);
            Ok(rows)
        }

        async fn list(&self, filters: &CourseFilterParams) -> Result<Paginated<Course>, AppError> {
            let tables = self.lock();
            let rows = newest_first(
                &tables.courses,
                |c| c.created_at,
                |c| {
                    filters.branch_id.is_none_or(|b| c.branch_id == Some(b))
                        && filters.semester.is_none_or(|s| c.semester == s)
                        && filters.is_active.is_none_or(|a| c.is_active == a)
                        && matches_search(
                            filters.search.as_deref(),
                            &[&c.course_name, &c.course_code],
                        )
                },
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn list_by_branch(&self, branch_id: BranchId) -> Result<Vec<Course>, AppError> {
            let mut rows: Vec<Course> = self
                .lock()
                .courses
                .iter()
                .filter(|c| c.is_active && c.branch_id == Some(branch_id))
                .cloned()
                .collect();
            by_semester_then_code(&mut rows);
            Ok(rows)
        }

        async fn list_by_semester(
            &self,
            semester: i32,
            branch_id: Option<BranchId>,
        ) -> Result<Vec<Course>, AppError> {
            let mut rows: Vec<Course> = self
                .lock()
                .courses
                .iter()
                .filter(|c| {
                    c.is_active
                        && c.semester == semester
                        && branch_id.is_none_or(|b| c.branch_id == Some(b))
                })
                .cloned()
                .collect();
            by_semester_then_code(&mut rows);
            Ok(rows)
        }

        async fn list_active(&self) -> Result<Vec<Course>, AppError> {
            let mut rows: Vec<Course> = self
                .lock()
                .courses
                .iter()
                .filter(|c| c.is_active)
                .cloned()
                .collect();
            by_semester_then_code(&mut rows);
            Ok(rows)
        }

        async fn update(&self, course: &Course) -> Result<Course, AppError> {
            let mut tables = self.lock();
            if tables
                .courses
                .iter()
                .any(|c| c.id != course.id && c.course_code == course.course_code)
            {
                return Err(AppError::bad_request(anyhow!("Course code already exists")));
            }
            let stored = tables
                .courses
                .iter_mut()
                .find(|c| c.id == course.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;
            let faculty_id = stored.faculty_id;
            let prerequisites = std::mem::take(&mut stored.prerequisites);
            *stored = course.clone();
            stored.faculty_id = faculty_id;
            stored.prerequisites = prerequisites;
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        }

        async fn delete(&self, id: CourseId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.courses.len();
            tables.courses.retain(|c| c.id != id);
            for course in tables.courses.iter_mut() {
                course.prerequisites.retain(|p| *p != id);
            }
            for student in tables.students.iter_mut() {
                student.enrolled_course_ids.retain(|c| *c != id);
            }
            for faculty in tables.faculty.iter_mut() {
                faculty.course_ids.retain(|c| *c != id);
            }
            Ok(tables.courses.len() < before)
        }

        async fn assign_faculty(
            &self,
            id: CourseId,
            faculty_user_id: UserId,
        ) -> Result<Option<Course>, AppError> {
            let mut tables = self.lock();
            Ok(tables.courses.iter_mut().find(|c| c.id == id).map(|c| {
                c.faculty_id = Some(faculty_user_id);
                c.updated_at = Utc::now();
                c.clone()
            }))
        }

        async fn add_prerequisite(
            &self,
            id: CourseId,
            prerequisite: CourseId,
        ) -> Result<Option<Course>, AppError> {
            let mut tables = self.lock();
            Ok(tables.courses.iter_mut().find(|c| c.id == id).map(|c| {
                if !c.prerequisites.contains(&prerequisite) {
                    c.prerequisites.push(prerequisite);
                }
                c.updated_at = Utc::now();
                c.clone()
            }))
        }

        async fn remove_prerequisite(
            &self,
            id: CourseId,
            prerequisite: CourseId,
        ) -> Result<Option<Course>, AppError> {
            let mut tables = self.lock();
            Ok(tables.courses.iter_mut().find(|c| c.id == id).map(|c| {
                c.prerequisites.retain(|p| *p != prerequisite);
                c.updated_at = Utc::now();
                c.clone()
            }))
        }
    }
}
