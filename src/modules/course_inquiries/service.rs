use anyhow::anyhow;
use collegium_core::{AppError, Paginated};
use collegium_models::InquiryId;
use collegium_models::inquiries::{
    CourseInquiry, CreateInquiryDto, InquiryFilterParams, InquiryStats, UpdateInquiryDto,
};
use tracing::{info, instrument};

use crate::store::Repositories;

pub struct InquiryService;

fn inquiry_not_found() -> AppError {
    AppError::not_found(anyhow!("Inquiry not found"))
}

impl InquiryService {
    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "course_inquiries"))]
    pub async fn create(
        repos: &Repositories,
        dto: CreateInquiryDto,
    ) -> Result<CourseInquiry, AppError> {
        let inquiry = repos.inquiries.create(&dto).await?;
        info!(inquiry.id = %inquiry.id, source = ?inquiry.heard_about_us, "course inquiry received");
        Ok(inquiry)
    }

    #[instrument(skip(repos))]
    pub async fn list(
        repos: &Repositories,
        filters: InquiryFilterParams,
    ) -> Result<Paginated<CourseInquiry>, AppError> {
        repos.inquiries.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn get(repos: &Repositories, id: InquiryId) -> Result<CourseInquiry, AppError> {
        repos
            .inquiries
            .find_by_id(id)
            .await?
            .ok_or_else(inquiry_not_found)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "UPDATE", db.table = "course_inquiries"))]
    pub async fn update(
        repos: &Repositories,
        id: InquiryId,
        dto: UpdateInquiryDto,
    ) -> Result<CourseInquiry, AppError> {
        let mut inquiry = Self::get(repos, id).await?;
        if let Some(status) = dto.status {
            inquiry.status = status;
        }
        if let Some(notes) = dto.notes {
            inquiry.notes = Some(notes);
        }
        let inquiry = repos.inquiries.update(&inquiry).await?;
        info!(inquiry.id = %inquiry.id, status = ?inquiry.status, "course inquiry updated");
        Ok(inquiry)
    }

    #[instrument(skip(repos), fields(db.operation = "DELETE", db.table = "course_inquiries"))]
    pub async fn delete(repos: &Repositories, id: InquiryId) -> Result<(), AppError> {
        if !repos.inquiries.delete(id).await? {
            return Err(inquiry_not_found());
        }
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn stats(repos: &Repositories) -> Result<InquiryStats, AppError> {
        let counts = repos.inquiries.count_by_status().await?;
        Ok(InquiryStats::from_counts(&counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collegium_core::PaginationParams;
    use collegium_models::inquiries::{InquirySource, InquiryStatus};

    fn dto(name: &str) -> CreateInquiryDto {
        CreateInquiryDto {
            name: name.to_string(),
            email: format!(" {}@Example.com ", name),
            phone: "9876543210".to_string(),
            qualification: "12th".to_string(),
            heard_about_us: InquirySource::Website,
            message: String::new(),
        }
    }

    #[tokio::test]
    async fn test_new_inquiry_is_pending() {
        let repos = Repositories::in_memory();
        let inquiry = InquiryService::create(&repos, dto("kiran")).await.unwrap();
        assert_eq!(inquiry.status, InquiryStatus::Pending);
        assert_eq!(inquiry.email, "kiran@example.com");
    }

    #[tokio::test]
    async fn test_status_filter_and_stats() {
        let repos = Repositories::in_memory();
        let first = InquiryService::create(&repos, dto("kiran")).await.unwrap();
        InquiryService::create(&repos, dto("meera")).await.unwrap();
        InquiryService::create(&repos, dto("arjun")).await.unwrap();

        InquiryService::update(
            &repos,
            first.id,
            UpdateInquiryDto {
                status: Some(InquiryStatus::Enrolled),
                notes: Some("Joined the evening batch".to_string()),
            },
        )
        .await
        .unwrap();

        let enrolled = InquiryService::list(
            &repos,
            InquiryFilterParams {
                status: Some(InquiryStatus::Enrolled),
                pagination: PaginationParams::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(enrolled.pagination.total, 1);
        assert_eq!(
            enrolled.data[0].notes.as_deref(),
            Some("Joined the evening batch")
        );

        let stats = InquiryService::stats(&repos).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.enrolled, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_inquiry() {
        let repos = Repositories::in_memory();
        let err = InquiryService::delete(&repos, InquiryId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
