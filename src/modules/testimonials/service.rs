use anyhow::anyhow;
use collegium_core::AppError;
use collegium_models::TestimonialId;
use collegium_models::testimonials::{
    CreateTestimonialDto, Testimonial, TestimonialFilterParams, UpdateTestimonialDto,
};
use tracing::{info, instrument};

use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;

pub struct TestimonialService;

fn testimonial_not_found() -> AppError {
    AppError::not_found(anyhow!("Testimonial not found"))
}

impl TestimonialService {
    async fn require_testimonial(
        repos: &Repositories,
        id: TestimonialId,
    ) -> Result<Testimonial, AppError> {
        repos
            .testimonials
            .find_by_id(id)
            .await?
            .ok_or_else(testimonial_not_found)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "testimonials"))]
    pub async fn create(
        repos: &Repositories,
        dto: CreateTestimonialDto,
    ) -> Result<Testimonial, AppError> {
        let testimonial = repos.testimonials.create(&dto).await?;
        info!(testimonial.id = %testimonial.id, "testimonial created");
        Ok(testimonial)
    }

    #[instrument(skip(repos))]
    pub async fn list(
        repos: &Repositories,
        filters: TestimonialFilterParams,
    ) -> Result<Vec<Testimonial>, AppError> {
        repos.testimonials.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn get(repos: &Repositories, id: TestimonialId) -> Result<Testimonial, AppError> {
        Self::require_testimonial(repos, id).await
    }

    #[instrument(skip(repos, cleanup, dto), fields(db.operation = "UPDATE", db.table = "testimonials"))]
    pub async fn update(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: TestimonialId,
        dto: UpdateTestimonialDto,
    ) -> Result<Testimonial, AppError> {
        let mut testimonial = Self::require_testimonial(repos, id).await?;
        let replaced = dto.apply(&mut testimonial);
        let testimonial = repos.testimonials.update(&testimonial).await?;
        if let Some(public_id) = replaced {
            cleanup.delete_one(&public_id).await;
        }
        Ok(testimonial)
    }

    #[instrument(skip(repos, cleanup), fields(db.operation = "DELETE", db.table = "testimonials"))]
    pub async fn delete(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: TestimonialId,
    ) -> Result<(), AppError> {
        let testimonial = Self::require_testimonial(repos, id).await?;
        if !repos.testimonials.delete(id).await? {
            return Err(testimonial_not_found());
        }
        cleanup.delete_one(&testimonial.image.public_id).await;
        info!(testimonial.id = %id, "testimonial deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn toggle_status(
        repos: &Repositories,
        id: TestimonialId,
    ) -> Result<Testimonial, AppError> {
        repos
            .testimonials
            .toggle_active(id)
            .await?
            .ok_or_else(testimonial_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use collegium_core::image_storage::MemoryImageStorage;
    use collegium_models::ImageRef;
    use collegium_models::testimonials::DEFAULT_RATING;
    use std::sync::Arc;

    fn setup() -> (Repositories, ImageCleanup, MemoryImageStorage) {
        let repos = Repositories::from_memory(MemoryStore::new());
        let storage = MemoryImageStorage::new();
        let cleanup = ImageCleanup::new(
            Arc::new(storage.clone()),
            repos.pending_image_deletions.clone(),
        );
        (repos, cleanup, storage)
    }

    fn dto(name: &str, order: Option<i32>) -> CreateTestimonialDto {
        CreateTestimonialDto {
            name: name.to_string(),
            title: None,
            role: Some("Alumnus".to_string()),
            description: "The faculty made all the difference.".to_string(),
            image: ImageRef {
                url: format!("https://cdn.example.com/{}.png", name),
                public_id: format!("testimonials/{}", name),
            },
            rating: None,
            display_order: order,
        }
    }

    #[tokio::test]
    async fn test_defaults_and_ordering() {
        let (repos, ..) = setup();
        let first = TestimonialService::create(&repos, dto("asha", Some(2))).await.unwrap();
        assert_eq!(first.rating, DEFAULT_RATING);
        TestimonialService::create(&repos, dto("ravi", None)).await.unwrap();
        TestimonialService::create(&repos, dto("neha", None)).await.unwrap();

        let all = TestimonialService::list(&repos, TestimonialFilterParams::default())
            .await
            .unwrap();
        let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["neha", "ravi", "asha"]);

        let limited = TestimonialService::list(
            &repos,
            TestimonialFilterParams {
                is_active: Some(true),
                limit: Some(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_update_image_and_delete_cascade() {
        let (repos, cleanup, storage) = setup();
        let testimonial = TestimonialService::create(&repos, dto("asha", None)).await.unwrap();

        let updated = TestimonialService::update(
            &repos,
            &cleanup,
            testimonial.id,
            UpdateTestimonialDto {
                image: Some(ImageRef {
                    url: "https://cdn.example.com/asha-2.png".to_string(),
                    public_id: "testimonials/asha-2".to_string(),
                }),
                rating: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.rating, 4);

        TestimonialService::delete(&repos, &cleanup, testimonial.id)
            .await
            .unwrap();
        assert_eq!(
            storage.delete_attempts(),
            vec!["testimonials/asha", "testimonials/asha-2"]
        );
    }
}
