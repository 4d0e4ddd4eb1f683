use anyhow::anyhow;
use chrono::Utc;
use collegium_core::{AppError, Paginated};
use collegium_models::branches::{
    Branch, BranchDetails, BranchFilterParams, BranchStatistics, CreateBranchDto, NewBranch,
    UpdateBranchDto,
};
use collegium_models::images::AddImagesDto;
use collegium_models::{BranchId, BranchImage, UserId, UserRole, UserSummary};
use tracing::{debug, info, instrument, warn};

use super::repository::SeatAdjustment;
use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;

pub struct BranchService;

impl BranchService {
    async fn require_branch(repos: &Repositories, id: BranchId) -> Result<Branch, AppError> {
        repos
            .branches
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))
    }

    async fn require_faculty_user(
        repos: &Repositories,
        user_id: UserId,
        message: &'static str,
    ) -> Result<(), AppError> {
        match repos.users.find_by_id(user_id).await? {
            Some(user) if user.role == UserRole::Faculty => Ok(()),
            _ => Err(AppError::bad_request(anyhow!(message))),
        }
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "branches"))]
    pub async fn create_branch(
        repos: &Repositories,
        dto: CreateBranchDto,
    ) -> Result<Branch, AppError> {
        if let Some(head) = dto.department_head {
            Self::require_faculty_user(repos, head, "Department head must be a valid faculty member")
                .await?;
        }

        let now = Utc::now();
        let branch = repos
            .branches
            .create(NewBranch {
                branch_name: dto.branch_name,
                branch_code: dto.branch_code.trim().to_uppercase(),
                description: dto.description,
                address: dto.address,
                city: dto.city,
                state: dto.state,
                pincode: dto.pincode,
                contact_phone: dto.contact_phone,
                contact_email: dto.contact_email,
                facilities: dto.facilities,
                is_headquarters: dto.is_headquarters,
                department_head: dto.department_head,
                total_seats: dto.total_seats,
                available_seats: dto.available_seats.unwrap_or(dto.total_seats),
                established_year: dto.established_year,
                images: dto
                    .images
                    .into_iter()
                    .map(|image| BranchImage::from_ref(image, now))
                    .collect(),
            })
            .await?;

        info!(branch.id = %branch.id, branch.code = %branch.branch_code, "branch created");
        Ok(branch)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "UPDATE", db.table = "branches"))]
    pub async fn update_branch(
        repos: &Repositories,
        id: BranchId,
        dto: UpdateBranchDto,
    ) -> Result<Branch, AppError> {
        let mut branch = Self::require_branch(repos, id).await?;

        if let Some(head) = dto.department_head {
            Self::require_faculty_user(repos, head, "Department head must be a valid faculty member")
                .await?;
        }

        let seats = dto.seat_change();
        if !seats.is_empty() {
            seats
                .resolve(branch.total_seats, branch.available_seats)
                .map_err(|e| AppError::bad_request(anyhow!(e.message())))?;
        }
        dto.apply(&mut branch);

        let branch = repos.branches.update(&branch, seats).await?;
        debug!(branch.id = %branch.id, "branch updated");
        Ok(branch)
    }

    /// Refuses while users still belong to the branch; then deletes every
    /// branch image from remote storage.
    #[instrument(skip(repos, cleanup), fields(db.operation = "DELETE", db.table = "branches"))]
    pub async fn delete_branch(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: BranchId,
    ) -> Result<(), AppError> {
        let branch = Self::require_branch(repos, id).await?;

        let users = repos.users.count_by_branch(id).await?;
        if users > 0 {
            warn!(branch.id = %id, users, "refusing to delete branch with users");
            return Err(AppError::bad_request(anyhow!(
                "Cannot delete branch with associated users"
            )));
        }

        if !repos.branches.delete(id).await? {
            return Err(AppError::not_found(anyhow!("Branch not found")));
        }
        cleanup.delete_all(branch.image_public_ids()).await;

        info!(branch.id = %id, "branch deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn get_branch(repos: &Repositories, id: BranchId) -> Result<BranchDetails, AppError> {
        let branch = Self::require_branch(repos, id).await?;
        let head = match branch.department_head {
            Some(head_id) => repos
                .users
                .find_by_id(head_id)
                .await?
                .map(|u| UserSummary::from(&u)),
            None => None,
        };
        Ok(BranchDetails { branch, head })
    }

    #[instrument(skip(repos))]
    pub async fn list_branches(
        repos: &Repositories,
        filters: BranchFilterParams,
    ) -> Result<Paginated<Branch>, AppError> {
        repos.branches.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn list_active_branches(repos: &Repositories) -> Result<Vec<Branch>, AppError> {
        repos.branches.list_active().await
    }

    #[instrument(skip(repos))]
    pub async fn get_statistics(
        repos: &Repositories,
        id: BranchId,
    ) -> Result<BranchStatistics, AppError> {
        let branch = Self::require_branch(repos, id).await?;
        let users = repos.users.count_by_branch(id).await?;
        Ok(BranchStatistics::new(branch, users))
    }

    #[instrument(skip(repos))]
    pub async fn assign_department_head(
        repos: &Repositories,
        id: BranchId,
        faculty_user_id: UserId,
    ) -> Result<Branch, AppError> {
        Self::require_branch(repos, id).await?;
        Self::require_faculty_user(repos, faculty_user_id, "Invalid faculty member").await?;

        let branch = repos
            .branches
            .assign_department_head(id, faculty_user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))?;
        info!(branch.id = %id, head = %faculty_user_id, "department head assigned");
        Ok(branch)
    }

    /// Positive `delta` frees seats, negative takes them. The bound check and
    /// the write happen in one conditional update.
    #[instrument(skip(repos))]
    pub async fn update_seats_availability(
        repos: &Repositories,
        id: BranchId,
        delta: i32,
    ) -> Result<Branch, AppError> {
        match repos.branches.adjust_seats(id, delta).await? {
            SeatAdjustment::Updated(branch) => {
                debug!(branch.id = %id, available = branch.available_seats, "seats adjusted");
                Ok(branch)
            }
            SeatAdjustment::NotFound => Err(AppError::not_found(anyhow!("Branch not found"))),
            SeatAdjustment::Insufficient => {
                Err(AppError::bad_request(anyhow!("Not enough available seats")))
            }
            SeatAdjustment::OverCapacity => Err(AppError::bad_request(anyhow!(
                "Available seats cannot exceed total seats"
            ))),
        }
    }

    #[instrument(skip(repos, dto))]
    pub async fn add_images(
        repos: &Repositories,
        id: BranchId,
        dto: AddImagesDto,
    ) -> Result<Branch, AppError> {
        let now = Utc::now();
        let images = dto
            .images
            .into_iter()
            .map(|image| BranchImage::from_ref(image, now))
            .collect();
        repos
            .branches
            .add_images(id, images)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))
    }

    #[instrument(skip(repos, cleanup))]
    pub async fn remove_image(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: BranchId,
        public_id: &str,
    ) -> Result<Branch, AppError> {
        let branch = Self::require_branch(repos, id).await?;
        if !branch.images.iter().any(|i| i.public_id == public_id) {
            return Err(AppError::not_found(anyhow!("Image not found")));
        }

        let branch = repos
            .branches
            .remove_image(id, public_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))?;
        cleanup.delete_one(public_id).await;
        Ok(branch)
    }
}
