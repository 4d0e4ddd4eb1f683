//! Student sub-profile models and DTOs.

use crate::courses::CourseSummary;
use crate::ids::{BranchId, CourseId, StudentId, UserId};
use crate::users::User;
use crate::validation::{validate_blood_group, validate_phone};
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::{
    deserialize_optional_bool, deserialize_optional_from_str, deserialize_optional_i32,
    deserialize_optional_i64,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// GPA at or above which a student is flagged as outstanding.
pub const OUTSTANDING_GPA_THRESHOLD: f64 = 8.5;
pub const MIN_SEMESTER: i32 = 1;
pub const MAX_SEMESTER: i32 = 8;
pub const MAX_GPA: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Academic,
    Sports,
    Cultural,
    Technical,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Achievement {
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub category: AchievementCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub student_id: String,
    pub roll_number: String,
    pub admission_year: i32,
    pub current_semester: i32,
    pub gpa: f64,
    pub attendance: f64,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
    pub qualification: Option<String>,
    pub heard_about_us: Option<String>,
    pub blood_group: Option<String>,
    pub is_outstanding: bool,
    #[schema(value_type = Vec<Achievement>)]
    pub achievements: Json<Vec<Achievement>>,
    pub enrolled_course_ids: Vec<CourseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a student sub-profile.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_id: String,
    pub roll_number: String,
    pub admission_year: i32,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
    pub qualification: Option<String>,
    pub heard_about_us: Option<String>,
}

/// Student with its owning user and enrolled courses resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentDetails {
    #[serde(flatten)]
    pub student: Student,
    pub user: Option<User>,
    pub enrolled_courses: Vec<CourseSummary>,
}

/// Admin-side partial update.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 20))]
    pub roll_number: Option<String>,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8"))]
    pub current_semester: Option<i32>,
    #[validate(length(min = 2, max = 100))]
    pub guardian_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub guardian_contact: Option<String>,
    #[validate(length(max = 200))]
    pub qualification: Option<String>,
    #[validate(length(max = 200))]
    pub heard_about_us: Option<String>,
    #[validate(custom(function = "validate_blood_group"))]
    pub blood_group: Option<String>,
}

impl UpdateStudentDto {
    pub fn apply(self, student: &mut Student) {
        if let Some(roll_number) = self.roll_number {
            student.roll_number = roll_number;
        }
        if let Some(semester) = self.current_semester {
            student.current_semester = semester;
        }
        if let Some(guardian_name) = self.guardian_name {
            student.guardian_name = Some(guardian_name);
        }
        if let Some(guardian_contact) = self.guardian_contact {
            student.guardian_contact = Some(guardian_contact);
        }
        if let Some(qualification) = self.qualification {
            student.qualification = Some(qualification);
        }
        if let Some(heard_about_us) = self.heard_about_us {
            student.heard_about_us = Some(heard_about_us);
        }
        if let Some(blood_group) = self.blood_group {
            student.blood_group = Some(blood_group);
        }
    }
}

/// GPA is range-checked by the service so out-of-range values never
/// reach a lookup.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateGpaDto {
    pub gpa: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAttendanceDto {
    pub attendance: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddAchievementDto {
    #[validate(length(min = 1, max = 200, message = "Achievement title is required"))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: AchievementCategory,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnrollCourseDto {
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    /// Filter by the owning user's branch
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub branch_id: Option<BranchId>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub semester: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_outstanding: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopPerformersParams {
    /// Number of students to return (default 10, max 100)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub branch_id: Option<BranchId>,
}

impl TopPerformersParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BranchScopeParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub branch_id: Option<BranchId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_student_validation() {
        let dto = UpdateStudentDto {
            current_semester: Some(9),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateStudentDto {
            blood_group: Some("AB+".to_string()),
            current_semester: Some(3),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_achievement_category_defaults_to_other() {
        let dto: AddAchievementDto = serde_json::from_str(r#"{"title": "Hackathon winner"}"#).unwrap();
        assert_eq!(dto.category, AchievementCategory::Other);
        assert!(dto.date.is_none());
    }

    #[test]
    fn test_top_performers_limit_clamped() {
        let params = TopPerformersParams {
            limit: Some(1000),
            branch_id: None,
        };
        assert_eq!(params.limit(), 100);
        assert_eq!(TopPerformersParams::default().limit(), 10);
    }

    #[test]
    fn test_filter_params_from_query_strings() {
        let params: StudentFilterParams =
            serde_json::from_str(r#"{"semester": "3", "is_outstanding": "true", "branch_id": ""}"#)
                .unwrap();
        assert_eq!(params.semester, Some(3));
        assert_eq!(params.is_outstanding, Some(true));
        assert!(params.branch_id.is_none());
    }
}
