use anyhow::anyhow;
use chrono::Utc;
use collegium_core::{AppError, Paginated, PaginationParams};
use collegium_models::courses::CourseSummary;
use collegium_models::students::{
    Achievement, AddAchievementDto, MAX_GPA, MAX_SEMESTER, MIN_SEMESTER, Student,
    StudentDetails, StudentFilterParams, UpdateStudentDto,
};
use collegium_models::{BranchId, CourseId, StudentId, UserId};
use tracing::{info, instrument};

use crate::modules::students::repository::PromotionOutcome;
use crate::store::Repositories;

pub struct StudentService;

fn student_not_found() -> AppError {
    AppError::not_found(anyhow!("Student not found"))
}

impl StudentService {
    async fn require_student(repos: &Repositories, id: StudentId) -> Result<Student, AppError> {
        repos
            .students
            .find_by_id(id)
            .await?
            .ok_or_else(student_not_found)
    }

    async fn details(repos: &Repositories, student: Student) -> Result<StudentDetails, AppError> {
        let user = repos.users.find_by_id(student.user_id).await?;
        let enrolled_courses = repos
            .courses
            .find_many(&student.enrolled_course_ids)
            .await?
            .iter()
            .map(CourseSummary::from)
            .collect();
        Ok(StudentDetails {
            student,
            user,
            enrolled_courses,
        })
    }

    #[instrument(skip(repos))]
    pub async fn get_student(
        repos: &Repositories,
        id: StudentId,
    ) -> Result<StudentDetails, AppError> {
        let student = Self::require_student(repos, id).await?;
        Self::details(repos, student).await
    }

    #[instrument(skip(repos))]
    pub async fn get_by_user_id(
        repos: &Repositories,
        user_id: UserId,
    ) -> Result<StudentDetails, AppError> {
        let student = repos
            .students
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(student_not_found)?;
        Self::details(repos, student).await
    }

    #[instrument(skip(repos, dto), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_student(
        repos: &Repositories,
        id: StudentId,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let mut student = Self::require_student(repos, id).await?;
        let semester = dto.current_semester;
        dto.apply(&mut student);
        repos.students.update(&student, semester).await
    }

    #[instrument(skip(repos))]
    pub async fn list_students(
        repos: &Repositories,
        filters: StudentFilterParams,
    ) -> Result<Paginated<Student>, AppError> {
        repos.students.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn list_outstanding(
        repos: &Repositories,
        pagination: PaginationParams,
    ) -> Result<Paginated<Student>, AppError> {
        repos.students.list_outstanding(&pagination).await
    }

    #[instrument(skip(repos))]
    pub async fn list_by_semester(
        repos: &Repositories,
        semester: i32,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError> {
        if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&semester) {
            return Err(AppError::bad_request(anyhow!(
                "Semester must be between {} and {}",
                MIN_SEMESTER,
                MAX_SEMESTER
            )));
        }
        repos.students.list_by_semester(semester, branch_id).await
    }

    /// Range-checked before the lookup, so an invalid value never touches
    /// the store.
    #[instrument(skip(repos), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_gpa(
        repos: &Repositories,
        id: StudentId,
        gpa: f64,
    ) -> Result<Student, AppError> {
        if !(0.0..=MAX_GPA).contains(&gpa) {
            return Err(AppError::bad_request(anyhow!("GPA must be between 0 and 10")));
        }
        let student = repos
            .students
            .set_gpa(id, gpa)
            .await?
            .ok_or_else(student_not_found)?;
        info!(student.id = %id, gpa, is_outstanding = student.is_outstanding, "gpa updated");
        Ok(student)
    }

    #[instrument(skip(repos), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_attendance(
        repos: &Repositories,
        id: StudentId,
        attendance: f64,
    ) -> Result<Student, AppError> {
        if !(0.0..=100.0).contains(&attendance) {
            return Err(AppError::bad_request(anyhow!(
                "Attendance must be between 0 and 100"
            )));
        }
        repos
            .students
            .set_attendance(id, attendance)
            .await?
            .ok_or_else(student_not_found)
    }

    #[instrument(skip(repos), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn promote(repos: &Repositories, id: StudentId) -> Result<Student, AppError> {
        match repos.students.promote(id).await? {
            PromotionOutcome::Promoted(student) => {
                info!(student.id = %id, semester = student.current_semester, "student promoted");
                Ok(student)
            }
            PromotionOutcome::FinalSemester => Err(AppError::bad_request(anyhow!(
                "Student is already in the final semester"
            ))),
            PromotionOutcome::NotFound => Err(student_not_found()),
        }
    }

    #[instrument(skip(repos, dto))]
    pub async fn add_achievement(
        repos: &Repositories,
        id: StudentId,
        dto: AddAchievementDto,
    ) -> Result<Student, AppError> {
        let achievement = Achievement {
            title: dto.title,
            description: dto.description,
            date: dto.date.unwrap_or_else(Utc::now),
            category: dto.category,
        };
        repos
            .students
            .add_achievement(id, achievement)
            .await?
            .ok_or_else(student_not_found)
    }

    #[instrument(skip(repos))]
    pub async fn top_performers(
        repos: &Repositories,
        limit: i64,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<Student>, AppError> {
        repos.students.top_performers(limit, branch_id).await
    }

    async fn check_course(repos: &Repositories, course_id: CourseId) -> Result<(), AppError> {
        if repos.courses.find_by_id(course_id).await?.is_none() {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn enroll_course(
        repos: &Repositories,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Student, AppError> {
        Self::check_course(repos, course_id).await?;
        let student = repos
            .students
            .enroll_course(id, course_id)
            .await?
            .ok_or_else(student_not_found)?;
        info!(student.id = %id, course.id = %course_id, "student enrolled");
        Ok(student)
    }

    #[instrument(skip(repos))]
    pub async fn unenroll_course(
        repos: &Repositories,
        id: StudentId,
        course_id: CourseId,
    ) -> Result<Student, AppError> {
        Self::check_course(repos, course_id).await?;
        repos
            .students
            .unenroll_course(id, course_id)
            .await?
            .ok_or_else(student_not_found)
    }
}
