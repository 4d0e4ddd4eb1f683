use async_trait::async_trait;
use collegium_core::{AppError, Paginated};
use collegium_models::faculty::{Faculty, FacultyFilterParams, NewFaculty};
use collegium_models::{FacultyId, UserId};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;
use crate::store::postgres::{like_pattern, profile_number_violation, unique_violation};

#[async_trait]
pub trait FacultyRepository: Send + Sync {
    async fn create(&self, faculty: NewFaculty) -> Result<Faculty, AppError>;
    async fn find_by_id(&self, id: FacultyId) -> Result<Option<Faculty>, AppError>;
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Faculty>, AppError>;
    async fn list(&self, filters: &FacultyFilterParams) -> Result<Paginated<Faculty>, AppError>;
    async fn list_active(&self) -> Result<Vec<Faculty>, AppError>;
    async fn update(&self, faculty: &Faculty) -> Result<Faculty, AppError>;
    async fn delete(&self, id: FacultyId) -> Result<bool, AppError>;
    /// Flips `is_active` and returns the new row.
    async fn toggle_active(&self, id: FacultyId) -> Result<Option<Faculty>, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &FacultyFilterParams) {
    query.push(" FROM faculty WHERE TRUE");
    if let Some(is_active) = filters.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR specialization ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl FacultyRepository for PgStore {
    async fn create(&self, faculty: NewFaculty) -> Result<Faculty, AppError> {
        sqlx::query_as::<_, Faculty>(
            r#"
            INSERT INTO faculty (id, user_id, employee_id, name, email, image, specialization,
                qualification, experience, expertise, course_ids, office_hours)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(FacultyId::new())
        .bind(faculty.user_id)
        .bind(&faculty.employee_id)
        .bind(&faculty.name)
        .bind(&faculty.email)
        .bind(faculty.image.map(Json))
        .bind(&faculty.specialization)
        .bind(&faculty.qualification)
        .bind(faculty.experience)
        .bind(&faculty.expertise)
        .bind(&faculty.course_ids)
        .bind(&faculty.office_hours)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            profile_number_violation(e, "faculty_employee_id_key", "Employee id already exists")
        })
    }

    async fn find_by_id(&self, id: FacultyId) -> Result<Option<Faculty>, AppError> {
        let faculty = sqlx::query_as::<_, Faculty>("SELECT * FROM faculty WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(faculty)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Faculty>, AppError> {
        let faculty = sqlx::query_as::<_, Faculty>("SELECT * FROM faculty WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(faculty)
    }

    async fn list(&self, filters: &FacultyFilterParams) -> Result<Paginated<Faculty>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT *");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let rows = query
            .build_query_as::<Faculty>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paginated::new(rows, total, &filters.pagination))
    }

    async fn list_active(&self) -> Result<Vec<Faculty>, AppError> {
        let rows = sqlx::query_as::<_, Faculty>(
            "SELECT * FROM faculty WHERE is_active ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn update(&self, faculty: &Faculty) -> Result<Faculty, AppError> {
        sqlx::query_as::<_, Faculty>(
            r#"
            UPDATE faculty
            SET employee_id = $2, name = $3, email = $4, image = $5, specialization = $6,
                qualification = $7, experience = $8, expertise = $9, course_ids = $10,
                office_hours = $11, is_active = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(faculty.id)
        .bind(&faculty.employee_id)
        .bind(&faculty.name)
        .bind(&faculty.email)
        .bind(&faculty.image)
        .bind(&faculty.specialization)
        .bind(&faculty.qualification)
        .bind(faculty.experience)
        .bind(&faculty.expertise)
        .bind(&faculty.course_ids)
        .bind(&faculty.office_hours)
        .bind(faculty.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, "Employee id already exists"))
    }

    async fn delete(&self, id: FacultyId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM faculty WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_active(&self, id: FacultyId) -> Result<Option<Faculty>, AppError> {
        let faculty = sqlx::query_as::<_, Faculty>(
            r#"
            UPDATE faculty SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(faculty)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::{matches_search, newest_first};
    use crate::utils::profile_number::ProfileNumberTaken;
    use anyhow::anyhow;
    use chrono::Utc;

    fn duplicate() -> AppError {
        ProfileNumberTaken("Employee id already exists").into()
    }

    #[async_trait]
    impl FacultyRepository for MemoryStore {
        async fn create(&self, faculty: NewFaculty) -> Result<Faculty, AppError> {
            let mut tables = self.lock();
            if tables
                .faculty
                .iter()
                .any(|f| f.employee_id == faculty.employee_id)
            {
                return Err(duplicate());
            }
            let now = Utc::now();
            let row = Faculty {
                id: FacultyId::new(),
                user_id: faculty.user_id,
                employee_id: faculty.employee_id,
                name: faculty.name,
                email: faculty.email,
                image: faculty.image.map(Json),
                specialization: faculty.specialization,
                qualification: faculty.qualification,
                experience: faculty.experience,
                expertise: faculty.expertise,
                course_ids: faculty.course_ids,
                office_hours: faculty.office_hours,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            tables.faculty.push(row.clone());
            Ok(row)
        }

        async fn find_by_id(&self, id: FacultyId) -> Result<Option<Faculty>, AppError> {
            Ok(self.lock().faculty.iter().find(|f| f.id == id).cloned())
        }

        async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Faculty>, AppError> {
            Ok(self
                .lock()
                .faculty
                .iter()
                .find(|f| f.user_id == Some(user_id))
                .cloned())
        }

        async fn list(&self, filters: &FacultyFilterParams) -> Result<Paginated<Faculty>, AppError> {
            let rows = newest_first(
                &self.lock().faculty,
                |f| f.created_at,
                |f| {
                    filters.is_active.is_none_or(|a| f.is_active == a)
                        && matches_search(
                            filters.search.as_deref(),
                            &[&f.name, &f.email, &f.specialization],
                        )
                },
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn list_active(&self) -> Result<Vec<Faculty>, AppError> {
            Ok(newest_first(&self.lock().faculty, |f| f.created_at, |f| f.is_active))
        }

        async fn update(&self, faculty: &Faculty) -> Result<Faculty, AppError> {
            let mut tables = self.lock();
            if tables
                .faculty
                .iter()
                .any(|f| f.id != faculty.id && f.employee_id == faculty.employee_id)
            {
                return Err(duplicate());
            }
            let row = tables
                .faculty
                .iter_mut()
                .find(|f| f.id == faculty.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Faculty not found")))?;
            *row = Faculty {
                updated_at: Utc::now(),
                ..faculty.clone()
            };
            Ok(row.clone())
        }

        async fn delete(&self, id: FacultyId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.faculty.len();
            tables.faculty.retain(|f| f.id != id);
            Ok(tables.faculty.len() < before)
        }

        async fn toggle_active(&self, id: FacultyId) -> Result<Option<Faculty>, AppError> {
            let mut tables = self.lock();
            Ok(tables.faculty.iter_mut().find(|f| f.id == id).map(|f| {
                f.is_active = !f.is_active;
                f.updated_at = Utc::now();
                f.clone()
            }))
        }
    }
}
