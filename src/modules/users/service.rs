use anyhow::anyhow;
use collegium_core::AppError;
use collegium_models::branches::BranchSummary;
use collegium_models::courses::CourseSummary;
use collegium_models::profile::{FacultyProfileDetails, StudentProfileDetails, UserProfile};
use collegium_models::{User, UserId, UserRole};
use tracing::{debug, info, instrument};

use crate::store::Repositories;

pub struct UserService;

impl UserService {
    #[instrument(skip(repos))]
    pub async fn get_user(repos: &Repositories, user_id: UserId) -> Result<User, AppError> {
        repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    /// The user (never its password) with branch and role-specific details.
    ///
    /// A missing sub-profile is not an error: the base user comes back with
    /// every `*_details` field unset.
    #[instrument(skip(repos), fields(user.id = %user_id))]
    pub async fn get_user_profile(
        repos: &Repositories,
        user_id: UserId,
    ) -> Result<UserProfile, AppError> {
        let user = Self::get_user(repos, user_id).await?;

        let branch = match user.branch_id {
            Some(branch_id) => repos
                .branches
                .find_by_id(branch_id)
                .await?
                .map(|b| BranchSummary::from(&b)),
            None => None,
        };

        let role = user.role;
        let mut profile = UserProfile::base(user, branch);

        match role {
            UserRole::Student => {
                if let Some(student) = repos.students.find_by_user_id(user_id).await? {
                    let courses = repos.courses.find_many(&student.enrolled_course_ids).await?;
                    profile.student_details = Some(StudentProfileDetails {
                        student,
                        enrolled_courses: courses.iter().map(CourseSummary::from).collect(),
                    });
                }
            }
            UserRole::Faculty => {
                if let Some(faculty) = repos.faculty.find_by_user_id(user_id).await? {
                    let courses = repos.courses.find_many(&faculty.course_ids).await?;
                    profile.faculty_details = Some(FacultyProfileDetails {
                        faculty,
                        courses: courses.iter().map(CourseSummary::from).collect(),
                    });
                }
            }
            UserRole::Admin => {
                profile.admin_details = repos.users.find_admin_profile(user_id).await?;
            }
        }

        if profile.student_details.is_none()
            && profile.faculty_details.is_none()
            && profile.admin_details.is_none()
        {
            debug!(user.role = %role, "no sub-profile found, returning base user");
        }

        Ok(profile)
    }

    #[instrument(skip(repos), fields(user.id = %user_id))]
    pub async fn set_user_status(
        repos: &Repositories,
        user_id: UserId,
        is_active: bool,
    ) -> Result<User, AppError> {
        let user = repos
            .users
            .set_active(user_id, is_active)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
        info!(user.id = %user.id, is_active, "user status changed");
        Ok(user)
    }
}
