use async_trait::async_trait;
use collegium_core::AppError;
use collegium_models::OutstandingStudentId;
use collegium_models::outstanding_students::{CreateOutstandingStudentDto, OutstandingStudent};
use sqlx::types::Json;

use crate::store::PgStore;
use crate::store::postgres::unique_violation;

pub(crate) const DUPLICATE_RANK: &str = "A student with this rank already exists";

#[async_trait]
pub trait OutstandingStudentRepository: Send + Sync {
    async fn create(
        &self,
        dto: &CreateOutstandingStudentDto,
    ) -> Result<OutstandingStudent, AppError>;
    async fn find_by_id(
        &self,
        id: OutstandingStudentId,
    ) -> Result<Option<OutstandingStudent>, AppError>;
    async fn find_by_rank(&self, rank: i32) -> Result<Option<OutstandingStudent>, AppError>;
    /// Sorted by rank.
    async fn list(&self, is_active: Option<bool>) -> Result<Vec<OutstandingStudent>, AppError>;
    async fn update(&self, record: &OutstandingStudent) -> Result<OutstandingStudent, AppError>;
    async fn delete(&self, id: OutstandingStudentId) -> Result<bool, AppError>;
    async fn toggle_active(
        &self,
        id: OutstandingStudentId,
    ) -> Result<Option<OutstandingStudent>, AppError>;
}

#[async_trait]
impl OutstandingStudentRepository for PgStore {
    async fn create(
        &self,
        dto: &CreateOutstandingStudentDto,
    ) -> Result<OutstandingStudent, AppError> {
        sqlx::query_as::<_, OutstandingStudent>(
            r#"
            INSERT INTO outstanding_students (id, rank, name, image, college, company, role,
                package, skills, achievement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(OutstandingStudentId::new())
        .bind(dto.rank)
        .bind(&dto.name)
        .bind(Json(dto.image.clone()))
        .bind(&dto.college)
        .bind(&dto.company)
        .bind(&dto.role)
        .bind(&dto.package)
        .bind(&dto.skills)
        .bind(&dto.achievement)
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_RANK))
    }

    async fn find_by_id(
        &self,
        id: OutstandingStudentId,
    ) -> Result<Option<OutstandingStudent>, AppError> {
        let record = sqlx::query_as::<_, OutstandingStudent>(
            "SELECT * FROM outstanding_students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    async fn find_by_rank(&self, rank: i32) -> Result<Option<OutstandingStudent>, AppError> {
        let record = sqlx::query_as::<_, OutstandingStudent>(
            "SELECT * FROM outstanding_students WHERE rank = $1",
        )
        .bind(rank)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    async fn list(&self, is_active: Option<bool>) -> Result<Vec<OutstandingStudent>, AppError> {
        let records = sqlx::query_as::<_, OutstandingStudent>(
            r#"
            SELECT * FROM outstanding_students
            WHERE $1::boolean IS NULL OR is_active = $1
            ORDER BY rank ASC
            "#,
        )
        .bind(is_active)
        .fetch_all(self.pool())
        .await?;
        Ok(records)
    }

    async fn update(&self, record: &OutstandingStudent) -> Result<OutstandingStudent, AppError> {
        sqlx::query_as::<_, OutstandingStudent>(
            r#"
            UPDATE outstanding_students
            SET rank = $2, name = $3, image = $4, college = $5, company = $6, role = $7,
                package = $8, skills = $9, achievement = $10, is_active = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.rank)
        .bind(&record.name)
        .bind(&record.image)
        .bind(&record.college)
        .bind(&record.company)
        .bind(&record.role)
        .bind(&record.package)
        .bind(&record.skills)
        .bind(&record.achievement)
        .bind(record.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_RANK))
    }

    async fn delete(&self, id: OutstandingStudentId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM outstanding_students WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_active(
        &self,
        id: OutstandingStudentId,
    ) -> Result<Option<OutstandingStudent>, AppError> {
        let record = sqlx::query_as::<_, OutstandingStudent>(
            r#"
            UPDATE outstanding_students SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::anyhow;
    use chrono::Utc;

    #[async_trait]
    impl OutstandingStudentRepository for MemoryStore {
        async fn create(
            &self,
            dto: &CreateOutstandingStudentDto,
        ) -> Result<OutstandingStudent, AppError> {
            let mut tables = self.lock();
            if tables.outstanding_students.iter().any(|r| r.rank == dto.rank) {
                return Err(AppError::bad_request(anyhow!(DUPLICATE_RANK)));
            }
            let now = Utc::now();
            let record = OutstandingStudent {
                id: OutstandingStudentId::new(),
                rank: dto.rank,
                name: dto.name.clone(),
                image: Json(dto.image.clone()),
                college: dto.college.clone(),
                company: dto.company.clone(),
                role: dto.role.clone(),
                package: dto.package.clone(),
                skills: dto.skills.clone(),
                achievement: dto.achievement.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            tables.outstanding_students.push(record.clone());
            Ok(record)
        }

        async fn find_by_id(
            &self,
            id: OutstandingStudentId,
        ) -> Result<Option<OutstandingStudent>, AppError> {
            Ok(self
                .lock()
                .outstanding_students
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn find_by_rank(&self, rank: i32) -> Result<Option<OutstandingStudent>, AppError> {
            Ok(self
                .lock()
                .outstanding_students
                .iter()
                .find(|r| r.rank == rank)
                .cloned())
        }

        async fn list(&self, is_active: Option<bool>) -> Result<Vec<OutstandingStudent>, AppError> {
            let mut records: Vec<OutstandingStudent> = self
                .lock()
                .outstanding_students
                .iter()
                .filter(|r| is_active.is_none_or(|a| r.is_active == a))
                .cloned()
                .collect();
            records.sort_by_key(|r| r.rank);
            Ok(records)
        }

        async fn update(
            &self,
            record: &OutstandingStudent,
        ) -> Result<OutstandingStudent, AppError> {
            let mut tables = self.lock();
            if tables
                .outstanding_students
                .iter()
                .any(|r| r.id != record.id && r.rank == record.rank)
            {
                return Err(AppError::bad_request(anyhow!(DUPLICATE_RANK)));
            }
            let row = tables
                .outstanding_students
                .iter_mut()
                .find(|r| r.id == record.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Outstanding student not found")))?;
            *row = OutstandingStudent {
                updated_at: Utc::now(),
                ..record.clone()
            };
            Ok(row.clone())
        }

        async fn delete(&self, id: OutstandingStudentId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.outstanding_students.len();
            tables.outstanding_students.retain(|r| r.id != id);
            Ok(tables.outstanding_students.len() < before)
        }

        async fn toggle_active(
            &self,
            id: OutstandingStudentId,
        ) -> Result<Option<OutstandingStudent>, AppError> {
            let mut tables = self.lock();
            Ok(tables
                .outstanding_students
                .iter_mut()
                .find(|r| r.id == id)
                .map(|r| {
                    r.is_active = !r.is_active;
                    r.updated_at = Utc::now();
                    r.clone()
                }))
        }
    }
}
