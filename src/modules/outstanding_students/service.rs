use anyhow::anyhow;
use collegium_core::AppError;
use collegium_models::OutstandingStudentId;
use collegium_models::outstanding_students::{
    CreateOutstandingStudentDto, OutstandingStudent, UpdateOutstandingStudentDto,
};
use tracing::{info, instrument};

use super::repository::DUPLICATE_RANK;
use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;

pub struct OutstandingStudentService;

fn record_not_found() -> AppError {
    AppError::not_found(anyhow!("Outstanding student not found"))
}

impl OutstandingStudentService {
    async fn require_record(
        repos: &Repositories,
        id: OutstandingStudentId,
    ) -> Result<OutstandingStudent, AppError> {
        repos
            .outstanding_students
            .find_by_id(id)
            .await?
            .ok_or_else(record_not_found)
    }

    async fn check_rank_free(
        repos: &Repositories,
        rank: i32,
        except: Option<OutstandingStudentId>,
    ) -> Result<(), AppError> {
        match repos.outstanding_students.find_by_rank(rank).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(AppError::bad_request(anyhow!(DUPLICATE_RANK)))
            }
            _ => Ok(()),
        }
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "outstanding_students"))]
    pub async fn create(
        repos: &Repositories,
        dto: CreateOutstandingStudentDto,
    ) -> Result<OutstandingStudent, AppError> {
        Self::check_rank_free(repos, dto.rank, None).await?;
        let record = repos.outstanding_students.create(&dto).await?;
        info!(record.id = %record.id, rank = record.rank, "outstanding student created");
        Ok(record)
    }

    #[instrument(skip(repos))]
    pub async fn list(
        repos: &Repositories,
        is_active: Option<bool>,
    ) -> Result<Vec<OutstandingStudent>, AppError> {
        repos.outstanding_students.list(is_active).await
    }

    #[instrument(skip(repos))]
    pub async fn get(
        repos: &Repositories,
        id: OutstandingStudentId,
    ) -> Result<OutstandingStudent, AppError> {
        Self::require_record(repos, id).await
    }

    #[instrument(skip(repos, cleanup, dto), fields(db.operation = "UPDATE", db.table = "outstanding_students"))]
    pub async fn update(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: OutstandingStudentId,
        dto: UpdateOutstandingStudentDto,
    ) -> Result<OutstandingStudent, AppError> {
        let mut record = Self::require_record(repos, id).await?;
        if let Some(rank) = dto.rank
            && rank != record.rank
        {
            Self::check_rank_free(repos, rank, Some(id)).await?;
        }

        let replaced = dto.apply(&mut record);
        let record = repos.outstanding_students.update(&record).await?;
        if let Some(public_id) = replaced {
            cleanup.delete_one(&public_id).await;
        }
        Ok(record)
    }

    #[instrument(skip(repos, cleanup), fields(db.operation = "DELETE", db.table = "outstanding_students"))]
    pub async fn delete(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: OutstandingStudentId,
    ) -> Result<(), AppError> {
        let record = Self::require_record(repos, id).await?;
        if !repos.outstanding_students.delete(id).await? {
            return Err(record_not_found());
        }
        cleanup.delete_one(&record.image.public_id).await;
        info!(record.id = %id, "outstanding student deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn toggle_status(
        repos: &Repositories,
        id: OutstandingStudentId,
    ) -> Result<OutstandingStudent, AppError> {
        repos
            .outstanding_students
            .toggle_active(id)
            .await?
            .ok_or_else(record_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use collegium_core::image_storage::MemoryImageStorage;
    use collegium_models::ImageRef;
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

    fn dto(rank: i32) -> CreateOutstandingStudentDto {
        CreateOutstandingStudentDto {
            rank,
            name: format!("Alumnus {}", rank),
            image: ImageRef {
                url: format!("https://cdn.example.com/alumni/{}.png", rank),
                public_id: format!("alumni/{}", rank),
            },
            college: "NIT".to_string(),
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            package: "12 LPA".to_string(),
            skills: vec!["Rust".to_string()],
            achievement: None,
        }
    }

    #[tokio::test]
    async fn test_rank_is_unique_on_create_and_update() {
        let (repos, cleanup, _) = setup();
        OutstandingStudentService::create(&repos, dto(1)).await.unwrap();
        let second = OutstandingStudentService::create(&repos, dto(2)).await.unwrap();

        let err = OutstandingStudentService::create(&repos, dto(1))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "A student with this rank already exists");

        let err = OutstandingStudentService::update(
            &repos,
            &cleanup,
            second.id,
            UpdateOutstandingStudentDto {
                rank: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "A student with this rank already exists");

        // keeping the current rank is not a conflict
        OutstandingStudentService::update(
            &repos,
            &cleanup,
            second.id,
            UpdateOutstandingStudentDto {
                rank: Some(2),
                company: Some("Initech".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_sorted_by_rank_with_active_filter() {
        let (repos, ..) = setup();
        let third = OutstandingStudentService::create(&repos, dto(3)).await.unwrap();
        OutstandingStudentService::create(&repos, dto(1)).await.unwrap();
        OutstandingStudentService::create(&repos, dto(2)).await.unwrap();
        OutstandingStudentService::toggle_status(&repos, third.id)
            .await
            .unwrap();

        let all = OutstandingStudentService::list(&repos, None).await.unwrap();
        let ranks: Vec<i32> = all.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        let active = OutstandingStudentService::list(&repos, Some(true)).await.unwrap();
        assert_eq!(active.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_image() {
        let (repos, cleanup, storage) = setup();
        let record = OutstandingStudentService::create(&repos, dto(5)).await.unwrap();
        OutstandingStudentService::delete(&repos, &cleanup, record.id)
            .await
            .unwrap();
        assert_eq!(storage.delete_attempts(), vec!["alumni/5"]);
        assert!(OutstandingStudentService::get(&repos, record.id).await.is_err());
    }
}
