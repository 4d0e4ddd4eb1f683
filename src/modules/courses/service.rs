use anyhow::anyhow;
use collegium_core::{AppError, Paginated};
use collegium_models::branches::BranchSummary;
use collegium_models::courses::{
    Course, CourseDetails, CourseFilterParams, CourseSummary, CreateCourseDto, NewCourse,
    UpdateCourseDto,
};
use collegium_models::students::{MAX_SEMESTER, MIN_SEMESTER};
use collegium_models::{BranchId, CourseId, UserId, UserRole, UserSummary};
use tracing::{info, instrument};

use crate::store::Repositories;

pub struct CourseService;

impl CourseService {
    async fn require_course(repos: &Repositories, id: CourseId) -> Result<Course, AppError> {
        repos
            .courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    async fn check_branch(repos: &Repositories, branch_id: Option<BranchId>) -> Result<(), AppError> {
        if let Some(branch_id) = branch_id
            && repos.branches.find_by_id(branch_id).await?.is_none()
        {
            return Err(AppError::bad_request(anyhow!("Branch not found")));
        }
        Ok(())
    }

    async fn check_prerequisites(repos: &Repositories, ids: &[CourseId]) -> Result<(), AppError> {
        let found = repos.courses.find_many(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
            return Err(AppError::bad_request(anyhow!(
                "Prerequisite course {} not found",
                missing
            )));
        }
        Ok(())
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "courses"))]
    pub async fn create_course(
        repos: &Repositories,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let course = NewCourse::from(dto);
        Self::check_branch(repos, course.branch_id).await?;
        Self::check_prerequisites(repos, &course.prerequisites).await?;

        let course = repos.courses.create(course).await?;
        info!(course.id = %course.id, course.code = %course.course_code, "course created");
        Ok(course)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "UPDATE", db.table = "courses"))]
    pub async fn update_course(
        repos: &Repositories,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let mut course = Self::require_course(repos, id).await?;
        Self::check_branch(repos, dto.branch_id).await?;

        dto.apply(&mut course);
        repos.courses.update(&course).await
    }

    #[instrument(skip(repos), fields(db.operation = "DELETE", db.table = "courses"))]
    pub async fn delete_course(repos: &Repositories, id: CourseId) -> Result<(), AppError> {
        if !repos.courses.delete(id).await? {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        info!(course.id = %id, "course deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn get_course(repos: &Repositories, id: CourseId) -> Result<CourseDetails, AppError> {
        let course = Self::require_course(repos, id).await?;

        let branch = match course.branch_id {
            Some(branch_id) => repos
                .branches
                .find_by_id(branch_id)
                .await?
                .map(|b| BranchSummary::from(&b)),
            None => None,
        };
        let faculty = match course.faculty_id {
            Some(user_id) => repos
                .users
                .find_by_id(user_id)
                .await?
                .map(|u| UserSummary::from(&u)),
            None => None,
        };
        let prerequisite_courses = repos
            .courses
            .find_many(&course.prerequisites)
            .await?
            .iter()
            .map(CourseSummary::from)
            .collect();

        Ok(CourseDetails {
            course,
            branch,
            faculty,
            prerequisite_courses,
        })
    }

    #[instrument(skip(repos))]
    pub async fn list_courses(
        repos: &Repositories,
        filters: CourseFilterParams,
    ) -> Result<Paginated<Course>, AppError> {
        repos.courses.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn list_by_branch(
        repos: &Repositories,
        branch_id: BranchId,
    ) -> Result<Vec<Course>, AppError> {
        repos.courses.list_by_branch(branch_id).await
    }

    #[instrument(skip(repos))]
    pub async fn list_by_semester(
        repos: &Repositories,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Course>, AppError> {
        if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&semester) {
            return Err(AppError::bad_request(anyhow!(
                "Semester must be between {} and {}",
                MIN_SEMESTER,
                MAX_SEMESTER
            )));
        }
        repos.courses.list_by_semester(semester, branch_id).await
    }

    #[instrument(skip(repos))]
    pub async fn list_active(repos: &Repositories) -> Result<Vec<Course>, AppError> {
        repos.courses.list_active().await
    }

    #[instrument(skip(repos))]
    pub async fn assign_faculty(
        repos: &Repositories,
        id: CourseId,
        faculty_user_id: UserId,
    ) -> Result<Course, AppError> {
        Self::require_course(repos, id).await?;
        match repos.users.find_by_id(faculty_user_id).await? {
            Some(user) if user.role == UserRole::Faculty => {}
            _ => {
                return Err(AppError::bad_request(anyhow!(
                    "Faculty not found or invalid role"
                )));
            }
        }

        let course = repos
            .courses
            .assign_faculty(id, faculty_user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;
        info!(course.id = %id, faculty = %faculty_user_id, "faculty assigned to course");
        Ok(course)
    }

    #[instrument(skip(repos))]
    pub async fn add_prerequisite(
        repos: &Repositories,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Course, AppError> {
        if id == prerequisite {
            return Err(AppError::bad_request(anyhow!(
                "A course cannot be its own prerequisite"
            )));
        }
        Self::require_course(repos, id).await?;
        Self::check_prerequisites(repos, &[prerequisite]).await?;

        repos
            .courses
            .add_prerequisite(id, prerequisite)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    #[instrument(skip(repos))]
    pub async fn remove_prerequisite(
        repos: &Repositories,
        id: CourseId,
        prerequisite: CourseId,
    ) -> Result<Course, AppError> {
        repos
            .courses
            .remove_prerequisite(id, prerequisite)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }
}
