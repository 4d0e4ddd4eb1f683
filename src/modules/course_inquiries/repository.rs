use async_trait::async_trait;
use collegium_core::{AppError, Paginated};
use collegium_models::InquiryId;
use collegium_models::inquiries::{
    CourseInquiry, CreateInquiryDto, InquiryFilterParams, InquiryStatus,
};
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn create(&self, dto: &CreateInquiryDto) -> Result<CourseInquiry, AppError>;
    async fn find_by_id(&self, id: InquiryId) -> Result<Option<CourseInquiry>, AppError>;
    async fn list(
        &self,
        filters: &InquiryFilterParams,
    ) -> Result<Paginated<CourseInquiry>, AppError>;
    async fn update(&self, inquiry: &CourseInquiry) -> Result<CourseInquiry, AppError>;
    async fn delete(&self, id: InquiryId) -> Result<bool, AppError>;
    /// Only statuses with at least one inquiry appear.
    async fn count_by_status(&self) -> Result<Vec<(InquiryStatus, i64)>, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &InquiryFilterParams) {
    query.push(" FROM course_inquiries WHERE TRUE");
    if let Some(status) = filters.status {
        query.push(" AND status = ").push_bind(status);
    }
}

#[async_trait]
impl InquiryRepository for PgStore {
    async fn create(&self, dto: &CreateInquiryDto) -> Result<CourseInquiry, AppError> {
        let inquiry = sqlx::query_as::<_, CourseInquiry>(
            r#"
            INSERT INTO course_inquiries (id, name, email, phone, qualification,
                heard_about_us, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(InquiryId::new())
        .bind(dto.name.trim())
        .bind(dto.email.trim().to_lowercase())
        .bind(dto.phone.trim())
        .bind(&dto.qualification)
        .bind(dto.heard_about_us)
        .bind(&dto.message)
        .fetch_one(self.pool())
        .await?;
        Ok(inquiry)
    }

    async fn find_by_id(&self, id: InquiryId) -> Result<Option<CourseInquiry>, AppError> {
        let inquiry =
            sqlx::query_as::<_, CourseInquiry>("SELECT * FROM course_inquiries WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(inquiry)
    }

    async fn list(
        &self,
        filters: &InquiryFilterParams,
    ) -> Result<Paginated<CourseInquiry>, AppError> {
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
            .build_query_as::<CourseInquiry>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paginated::new(rows, total, &filters.pagination))
    }

    async fn update(&self, inquiry: &CourseInquiry) -> Result<CourseInquiry, AppError> {
        let updated = sqlx::query_as::<_, CourseInquiry>(
            r#"
            UPDATE course_inquiries
            SET status = $2, notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(inquiry.id)
        .bind(inquiry.status)
        .bind(&inquiry.notes)
        .fetch_one(self.pool())
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: InquiryId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM course_inquiries WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self) -> Result<Vec<(InquiryStatus, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (InquiryStatus, i64)>(
            "SELECT status, COUNT(*) FROM course_inquiries GROUP BY status",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(counts)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::newest_first;
    use anyhow::anyhow;
    use chrono::Utc;

    #[async_trait]
    impl InquiryRepository for MemoryStore {
        async fn create(&self, dto: &CreateInquiryDto) -> Result<CourseInquiry, AppError> {
            let now = Utc::now();
            let inquiry = CourseInquiry {
                id: InquiryId::new(),
                name: dto.name.trim().to_string(),
                email: dto.email.trim().to_lowercase(),
                phone: dto.phone.trim().to_string(),
                qualification: dto.qualification.clone(),
                heard_about_us: dto.heard_about_us,
                message: dto.message.clone(),
                status: InquiryStatus::Pending,
                notes: None,
                created_at: now,
                updated_at: now,
            };
            self.lock().inquiries.push(inquiry.clone());
            Ok(inquiry)
        }

        async fn find_by_id(&self, id: InquiryId) -> Result<Option<CourseInquiry>, AppError> {
            Ok(self.lock().inquiries.iter().find(|i| i.id == id).cloned())
        }

        async fn list(
            &self,
            filters: &InquiryFilterParams,
        ) -> Result<Paginated<CourseInquiry>, AppError> {
            let rows = newest_first(
                &self.lock().inquiries,
                |i| i.created_at,
                |i| filters.status.is_none_or(|s| i.status == s),
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn update(&self, inquiry: &CourseInquiry) -> Result<CourseInquiry, AppError> {
            let mut tables = self.lock();
            let row = tables
                .inquiries
                .iter_mut()
                .find(|i| i.id == inquiry.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Inquiry not found")))?;
            row.status = inquiry.status;
            row.notes = inquiry.notes.clone();
            row.updated_at = Utc::now();
            Ok(row.clone())
        }

        async fn delete(&self, id: InquiryId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.inquiries.len();
            tables.inquiries.retain(|i| i.id != id);
            Ok(tables.inquiries.len() < before)
        }

        async fn count_by_status(&self) -> Result<Vec<(InquiryStatus, i64)>, AppError> {
            let tables = self.lock();
            Ok(InquiryStatus::ALL
                .iter()
                .map(|&status| {
                    let count = tables.inquiries.iter().filter(|i| i.status == status).count();
                    (status, count as i64)
                })
                .filter(|&(_, count)| count > 0)
                .collect())
        }
    }
}
