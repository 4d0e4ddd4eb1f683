//! Course models and DTOs.

use crate::branches::BranchSummary;
use crate::ids::{BranchId, CourseId, UserId};
use crate::users::UserSummary;
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::{deserialize_optional_bool, deserialize_optional_from_str, deserialize_optional_i32};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_CREDITS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub course_name: String,
    pub course_code: String,
    pub description: String,
    pub duration: String,
    pub branch_id: Option<BranchId>,
    /// User id of the teaching faculty member.
    pub faculty_id: Option<UserId>,
    pub credits: i32,
    pub semester: i32,
    pub syllabus: Option<String>,
    pub prerequisites: Vec<CourseId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseSummary {
    pub id: CourseId,
    pub course_name: String,
    pub course_code: String,
    pub credits: i32,
    pub semester: i32,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            course_name: course.course_name.clone(),
            course_code: course.course_code.clone(),
            credits: course.credits,
            semester: course.semester,
        }
    }
}

/// Course with branch, faculty and prerequisites resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub branch: Option<BranchSummary>,
    pub faculty: Option<UserSummary>,
    pub prerequisite_courses: Vec<CourseSummary>,
}

/// Row values for a new course, code already upper-cased.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub course_code: String,
    pub description: String,
    pub duration: String,
    pub branch_id: Option<BranchId>,
    pub credits: i32,
    pub semester: i32,
    pub syllabus: Option<String>,
    pub prerequisites: Vec<CourseId>,
}

impl From<CreateCourseDto> for NewCourse {
    fn from(dto: CreateCourseDto) -> Self {
        let mut prerequisites = Vec::with_capacity(dto.prerequisites.len());
        for id in dto.prerequisites {
            if !prerequisites.contains(&id) {
                prerequisites.push(id);
            }
        }
        Self {
            course_name: dto.course_name,
            course_code: dto.course_code.trim().to_uppercase(),
            description: dto.description,
            duration: dto.duration,
            branch_id: dto.branch_id,
            credits: dto.credits.unwrap_or(DEFAULT_CREDITS),
            semester: dto.semester,
            syllabus: dto.syllabus,
            prerequisites,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 2, max = 150, message = "Course name must be between 2 and 150 characters"))]
    pub course_name: String,
    #[validate(length(min = 2, max = 20, message = "Course code must be between 2 and 20 characters"))]
    pub course_code: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub duration: String,
    pub branch_id: Option<BranchId>,
    #[validate(range(min = 1, max = 30, message = "Credits must be at least 1"))]
    pub credits: Option<i32>,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8"))]
    pub semester: i32,
    pub syllabus: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 2, max = 150))]
    pub course_name: Option<String>,
    #[validate(length(min = 2, max = 20))]
    pub course_code: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub duration: Option<String>,
    pub branch_id: Option<BranchId>,
    #[validate(range(min = 1, max = 30))]
    pub credits: Option<i32>,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8"))]
    pub semester: Option<i32>,
    pub syllabus: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCourseDto {
    pub fn apply(self, course: &mut Course) {
        if let Some(name) = self.course_name {
            course.course_name = name;
        }
        if let Some(code) = self.course_code {
            course.course_code = code.to_uppercase();
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(duration) = self.duration {
            course.duration = duration;
        }
        if let Some(branch_id) = self.branch_id {
            course.branch_id = Some(branch_id);
        }
        if let Some(credits) = self.credits {
            course.credits = credits;
        }
        if let Some(semester) = self.semester {
            course.semester = semester;
        }
        if let Some(syllabus) = self.syllabus {
            course.syllabus = Some(syllabus);
        }
        if let Some(is_active) = self.is_active {
            course.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignFacultyDto {
    /// User id of a faculty user.
    pub faculty_id: UserId,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PrerequisiteDto {
    pub prerequisite_id: CourseId,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub branch_id: Option<BranchId>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub semester: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Case-insensitive match on course name or code
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateCourseDto {
        CreateCourseDto {
            course_name: "Data Structures".to_string(),
            course_code: "cs201".to_string(),
            description: String::new(),
            duration: "6 months".to_string(),
            branch_id: None,
            credits: Some(4),
            semester: 3,
            syllabus: None,
            prerequisites: vec![],
        }
    }

    #[test]
    fn test_create_course_validation() {
        assert!(create_dto().validate().is_ok());

        let dto = CreateCourseDto {
            semester: 9,
            ..create_dto()
        };
        assert!(dto.validate().is_err());

        let dto = CreateCourseDto {
            credits: Some(0),
            ..create_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_new_course_defaults() {
        let prereq = CourseId::new();
        let course = NewCourse::from(CreateCourseDto {
            credits: None,
            prerequisites: vec![prereq, prereq],
            ..create_dto()
        });
        assert_eq!(course.course_code, "CS201");
        assert_eq!(course.credits, DEFAULT_CREDITS);
        assert_eq!(course.prerequisites, vec![prereq]);
    }

    #[test]
    fn test_update_uppercases_code() {
        let now = Utc::now();
        let mut course = Course {
            id: CourseId::new(),
            course_name: "Old".to_string(),
            course_code: "OLD1".to_string(),
            description: String::new(),
            duration: String::new(),
            branch_id: None,
            faculty_id: None,
            credits: 3,
            semester: 1,
            syllabus: None,
            prerequisites: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        UpdateCourseDto {
            course_code: Some("cs101".to_string()),
            ..Default::default()
        }
        .apply(&mut course);

        assert_eq!(course.course_code, "CS101");
        assert_eq!(course.course_name, "Old");
    }
}
