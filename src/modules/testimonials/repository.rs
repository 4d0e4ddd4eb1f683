use async_trait::async_trait;
use collegium_core::AppError;
use collegium_models::TestimonialId;
use collegium_models::testimonials::{
    CreateTestimonialDto, DEFAULT_RATING, Testimonial, TestimonialFilterParams,
};
use sqlx::types::Json;

use crate::store::PgStore;

#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    /// Applies the default rating and display order.
    async fn create(&self, dto: &CreateTestimonialDto) -> Result<Testimonial, AppError>;
    async fn find_by_id(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError>;
    /// By `display_order` ascending, newest first within an order.
    async fn list(&self, filters: &TestimonialFilterParams) -> Result<Vec<Testimonial>, AppError>;
    async fn update(&self, testimonial: &Testimonial) -> Result<Testimonial, AppError>;
    async fn delete(&self, id: TestimonialId) -> Result<bool, AppError>;
    async fn toggle_active(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError>;
}

#[async_trait]
impl TestimonialRepository for PgStore {
    async fn create(&self, dto: &CreateTestimonialDto) -> Result<Testimonial, AppError> {
        let testimonial = sqlx::query_as::<_, Testimonial>(
            r#"
            INSERT INTO testimonials (id, name, title, role, description, image, rating,
                display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(TestimonialId::new())
        .bind(&dto.name)
        .bind(&dto.title)
        .bind(&dto.role)
        .bind(&dto.description)
        .bind(Json(dto.image.clone()))
        .bind(dto.rating.unwrap_or(DEFAULT_RATING))
        .bind(dto.display_order.unwrap_or(0))
        .fetch_one(self.pool())
        .await?;
        Ok(testimonial)
    }

    async fn find_by_id(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError> {
        let testimonial =
            sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(testimonial)
    }

    async fn list(&self, filters: &TestimonialFilterParams) -> Result<Vec<Testimonial>, AppError> {
        let testimonials = sqlx::query_as::<_, Testimonial>(
            r#"
            SELECT * FROM testimonials
            WHERE $1::boolean IS NULL OR is_active = $1
            ORDER BY display_order ASC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(filters.is_active)
        .bind(filters.limit)
        .fetch_all(self.pool())
        .await?;
        Ok(testimonials)
    }

    async fn update(&self, testimonial: &Testimonial) -> Result<Testimonial, AppError> {
        let updated = sqlx::query_as::<_, Testimonial>(
            r#"
            UPDATE testimonials
            SET name = $2, title = $3, role = $4, description = $5, image = $6, rating = $7,
                display_order = $8, is_active = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(testimonial.id)
        .bind(&testimonial.name)
        .bind(&testimonial.title)
        .bind(&testimonial.role)
        .bind(&testimonial.description)
        .bind(&testimonial.image)
        .bind(testimonial.rating)
        .bind(testimonial.display_order)
        .bind(testimonial.is_active)
        .fetch_one(self.pool())
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: TestimonialId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_active(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError> {
        let testimonial = sqlx::query_as::<_, Testimonial>(
            r#"
            UPDATE testimonials SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(testimonial)
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
    impl TestimonialRepository for MemoryStore {
        async fn create(&self, dto: &CreateTestimonialDto) -> Result<Testimonial, AppError> {
            let now = Utc::now();
            let testimonial = Testimonial {
                id: TestimonialId::new(),
                name: dto.name.clone(),
                title: dto.title.clone(),
                role: dto.role.clone(),
                description: dto.description.clone(),
                image: Json(dto.image.clone()),
                rating: dto.rating.unwrap_or(DEFAULT_RATING),
                display_order: dto.display_order.unwrap_or(0),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            self.lock().testimonials.push(testimonial.clone());
            Ok(testimonial)
        }

        async fn find_by_id(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError> {
            Ok(self.lock().testimonials.iter().find(|t| t.id == id).cloned())
        }

        async fn list(
            &self,
            filters: &TestimonialFilterParams,
        ) -> Result<Vec<Testimonial>, AppError> {
            let mut rows = newest_first(
                &self.lock().testimonials,
                |t| t.created_at,
                |t| filters.is_active.is_none_or(|a| t.is_active == a),
            );
            // stable, so newest-first survives within an order
            rows.sort_by_key(|t| t.display_order);
            if let Some(limit) = filters.limit {
                rows.truncate(limit.max(0) as usize);
            }
            Ok(rows)
        }

        async fn update(&self, testimonial: &Testimonial) -> Result<Testimonial, AppError> {
            let mut tables = self.lock();
            let row = tables
                .testimonials
                .iter_mut()
                .find(|t| t.id == testimonial.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Testimonial not found")))?;
            *row = Testimonial {
                updated_at: Utc::now(),
                ..testimonial.clone()
            };
            Ok(row.clone())
        }

        async fn delete(&self, id: TestimonialId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.testimonials.len();
            tables.testimonials.retain(|t| t.id != id);
            Ok(tables.testimonials.len() < before)
        }

        async fn toggle_active(&self, id: TestimonialId) -> Result<Option<Testimonial>, AppError> {
            let mut tables = self.lock();
            Ok(tables.testimonials.iter_mut().find(|t| t.id == id).map(|t| {
                t.is_active = !t.is_active;
                t.updated_at = Utc::now();
                t.clone()
            }))
        }
    }
}
