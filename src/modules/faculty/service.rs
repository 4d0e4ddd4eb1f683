use anyhow::anyhow;
use collegium_core::{AppError, Paginated};
use collegium_models::courses::CourseSummary;
use collegium_models::faculty::{
    CreateFacultyDto, Faculty, FacultyDetails, FacultyFilterParams, NewFaculty, UpdateFacultyDto,
};
use collegium_models::ids::FACULTY_NUMBER_PREFIX;
use collegium_models::FacultyId;
use tracing::{info, instrument, warn};

use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;
use crate::utils::profile_number::with_profile_number;

pub struct FacultyService;

fn faculty_not_found() -> AppError {
    AppError::not_found(anyhow!("Faculty not found"))
}

impl FacultyService {
    async fn require_faculty(repos: &Repositories, id: FacultyId) -> Result<Faculty, AppError> {
        repos
            .faculty
            .find_by_id(id)
            .await?
            .ok_or_else(faculty_not_found)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "faculty"))]
    pub async fn create_faculty(
        repos: &Repositories,
        dto: CreateFacultyDto,
    ) -> Result<Faculty, AppError> {
        let employee_id = dto
            .employee_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let new_faculty = NewFaculty {
            user_id: None,
            employee_id: String::new(),
            name: dto.name,
            email: dto.email.trim().to_lowercase(),
            image: Some(dto.image),
            specialization: dto.specialization,
            qualification: dto.qualification,
            experience: dto.experience.unwrap_or(0),
            expertise: dto.expertise,
            course_ids: dto.course_ids,
            office_hours: dto.office_hours,
        };

        // An explicit employee id is used as is; a generated one is retried on collision.
        let faculty = match employee_id {
            Some(employee_id) => {
                repos
                    .faculty
                    .create(NewFaculty {
                        employee_id,
                        ..new_faculty
                    })
                    .await?
            }
            None => {
                let store = &repos.faculty;
                with_profile_number(FACULTY_NUMBER_PREFIX, move |employee_id| {
                    store.create(NewFaculty {
                        employee_id,
                        ..new_faculty.clone()
                    })
                })
                .await?
            }
        };
        info!(faculty.id = %faculty.id, employee_id = %faculty.employee_id, "faculty created");
        Ok(faculty)
    }

    #[instrument(skip(repos))]
    pub async fn list_faculty(
        repos: &Repositories,
        filters: FacultyFilterParams,
    ) -> Result<Paginated<Faculty>, AppError> {
        repos.faculty.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn list_active(repos: &Repositories) -> Result<Vec<Faculty>, AppError> {
        repos.faculty.list_active().await
    }

    #[instrument(skip(repos))]
    pub async fn get_faculty(
        repos: &Repositories,
        id: FacultyId,
    ) -> Result<FacultyDetails, AppError> {
        let faculty = Self::require_faculty(repos, id).await?;
        let courses = repos
            .courses
            .find_many(&faculty.course_ids)
            .await?
            .iter()
            .map(CourseSummary::from)
            .collect();
        Ok(FacultyDetails { faculty, courses })
    }

    /// Saves the merge first; a replaced image is deleted remotely only
    /// once the row no longer points at it.
    #[instrument(skip(repos, cleanup, dto), fields(db.operation = "UPDATE", db.table = "faculty"))]
    pub async fn update_faculty(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: FacultyId,
        dto: UpdateFacultyDto,
    ) -> Result<Faculty, AppError> {
        let mut faculty = Self::require_faculty(repos, id).await?;
        let replaced = dto.apply(&mut faculty);

        let faculty = repos.faculty.update(&faculty).await?;
        if let Some(public_id) = replaced {
            cleanup.delete_one(&public_id).await;
        }
        Ok(faculty)
    }

    /// Also deactivates the linked faculty account, if any, so no role=faculty
    /// user is left without a profile that can still log in.
    #[instrument(skip(repos, cleanup), fields(db.operation = "DELETE", db.table = "faculty"))]
    pub async fn delete_faculty(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: FacultyId,
    ) -> Result<(), AppError> {
        let faculty = Self::require_faculty(repos, id).await?;
        if !repos.faculty.delete(id).await? {
            return Err(faculty_not_found());
        }
        // A faculty account without its profile must not keep signing in.
        if let Some(user_id) = faculty.user_id
            && repos.users.set_active(user_id, false).await?.is_none()
        {
            warn!(faculty.id = %id, user.id = %user_id, "linked user already gone");
        }
        cleanup.delete_all(faculty.image_public_id()).await;
        info!(faculty.id = %id, "faculty deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn toggle_status(repos: &Repositories, id: FacultyId) -> Result<Faculty, AppError> {
        let faculty = repos
            .faculty
            .toggle_active(id)
            .await?
            .ok_or_else(faculty_not_found)?;
        info!(faculty.id = %id, is_active = faculty.is_active, "faculty status toggled");
        Ok(faculty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::repository::NewProfile;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use collegium_core::image_storage::MemoryImageStorage;
    use collegium_models::users::NewUser;
    use collegium_models::{ImageRef, UserRole};
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

    fn image(public_id: &str) -> ImageRef {
        ImageRef {
            url: format!("https://cdn.example.com/{}.png", public_id),
            public_id: public_id.to_string(),
        }
    }

    fn dto(employee_id: Option<&str>) -> CreateFacultyDto {
        CreateFacultyDto {
            name: "Dr. Arjun Rao".to_string(),
            email: "Arjun@Example.com".to_string(),
            employee_id: employee_id.map(str::to_string),
            image: image("faculty/arjun"),
            specialization: "Networks".to_string(),
            qualification: "PhD".to_string(),
            experience: None,
            expertise: vec!["Routing".to_string()],
            course_ids: Vec::new(),
            office_hours: None,
        }
    }

    #[tokio::test]
    async fn test_create_generates_employee_id() {
        let (repos, ..) = setup();
        let faculty = FacultyService::create_faculty(&repos, dto(None)).await.unwrap();
        assert!(faculty.employee_id.starts_with(FACULTY_NUMBER_PREFIX));
        assert_eq!(faculty.email, "arjun@example.com");
        assert_eq!(faculty.experience, 0);
        assert!(faculty.user_id.is_none());

        let err = FacultyService::create_faculty(&repos, {
            let mut d = dto(None);
            d.employee_id = Some(faculty.employee_id.clone());
            d
        })
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generated_employee_ids_never_collide() {
        let (repos, ..) = setup();
        let (first, second) = tokio::join!(
            FacultyService::create_faculty(&repos, dto(None)),
            FacultyService::create_faculty(&repos, dto(None)),
        );
        assert_ne!(first.unwrap().employee_id, second.unwrap().employee_id);
    }

    #[tokio::test]
    async fn test_delete_deactivates_linked_account() {
        let (repos, cleanup, _) = setup();
        let user = repos
            .users
            .create_with_profile(
                NewUser {
                    name: "Dr. Meera Iyer".to_string(),
                    email: "meera@example.com".to_string(),
                    password_hash: "hash".to_string(),
                    role: UserRole::Faculty,
                    phone: None,
                    address: None,
                    branch_id: None,
                },
                NewProfile::Faculty(NewFaculty {
                    user_id: None,
                    employee_id: "FAC-MEERA".to_string(),
                    name: "Dr. Meera Iyer".to_string(),
                    email: "meera@example.com".to_string(),
                    image: None,
                    specialization: "Optics".to_string(),
                    qualification: "PhD".to_string(),
                    experience: 4,
                    expertise: Vec::new(),
                    course_ids: Vec::new(),
                    office_hours: None,
                }),
            )
            .await
            .unwrap();
        let faculty = repos.faculty.find_by_user_id(user.id).await.unwrap().unwrap();

        FacultyService::delete_faculty(&repos, &cleanup, faculty.id)
            .await
            .unwrap();

        assert!(repos.faculty.find_by_id(faculty.id).await.unwrap().is_none());
        let user = repos.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Faculty);
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn test_replacing_image_deletes_old_remote_object() {
        let (repos, cleanup, storage) = setup();
        let faculty = FacultyService::create_faculty(&repos, dto(Some("FAC-1")))
            .await
            .unwrap();

        let updated = FacultyService::update_faculty(
            &repos,
            &cleanup,
            faculty.id,
            UpdateFacultyDto {
                image: Some(image("faculty/arjun-2")),
                experience: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.experience, 4);
        assert_eq!(updated.image_public_id().as_deref(), Some("faculty/arjun-2"));
        assert_eq!(storage.delete_attempts(), vec!["faculty/arjun".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cascades_image_and_survives_storage_outage() {
        let (repos, cleanup, storage) = setup();
        let faculty = FacultyService::create_faculty(&repos, dto(Some("FAC-2")))
            .await
            .unwrap();
        storage.set_fail_deletes(true);

        FacultyService::delete_faculty(&repos, &cleanup, faculty.id)
            .await
            .unwrap();

        assert_eq!(storage.delete_attempts(), vec!["faculty/arjun".to_string()]);
        assert_eq!(repos.pending_image_deletions.count().await.unwrap(), 1);
        let err = FacultyService::get_faculty(&repos, faculty.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_hides_from_active_list() {
        let (repos, ..) = setup();
        let faculty = FacultyService::create_faculty(&repos, dto(Some("FAC-3")))
            .await
            .unwrap();
        assert_eq!(FacultyService::list_active(&repos).await.unwrap().len(), 1);

        let toggled = FacultyService::toggle_status(&repos, faculty.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(FacultyService::list_active(&repos).await.unwrap().is_empty());
    }
}
