//! Faculty records.
//!
//! A faculty row is either the sub-profile of a registered faculty user
//! (`user_id` set) or a showcase entry created by an admin for the public
//! faculty listing (`user_id` empty).

use crate::courses::CourseSummary;
use crate::ids::{CourseId, FacultyId, UserId};
use crate::images::ImageRef;
use crate::validation::{deserialize_optional_string_list, deserialize_string_list};
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::deserialize_optional_bool;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Faculty {
    pub id: FacultyId,
    pub user_id: Option<UserId>,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    #[schema(value_type = Option<ImageRef>)]
    pub image: Option<Json<ImageRef>>,
    pub specialization: String,
    pub qualification: String,
    pub experience: i32,
    pub expertise: Vec<String>,
    pub course_ids: Vec<CourseId>,
    pub office_hours: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faculty {
    pub fn image_public_id(&self) -> Option<String> {
        self.image.as_ref().map(|i| i.public_id.clone())
    }
}

/// Row values for a new faculty record.
#[derive(Debug, Clone)]
pub struct NewFaculty {
    pub user_id: Option<UserId>,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<ImageRef>,
    pub specialization: String,
    pub qualification: String,
    pub experience: i32,
    pub expertise: Vec<String>,
    pub course_ids: Vec<CourseId>,
    pub office_hours: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FacultyDetails {
    #[serde(flatten)]
    pub faculty: Faculty,
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFacultyDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Generated as `FAC<epoch millis>` when absent.
    #[validate(length(min = 1, max = 50))]
    pub employee_id: Option<String>,
    #[validate(nested)]
    pub image: ImageRef,
    #[validate(length(min = 1, max = 200, message = "Specialization is required"))]
    pub specialization: String,
    #[validate(length(min = 1, max = 200, message = "Qualification is required"))]
    pub qualification: String,
    #[validate(range(min = 0, max = 70, message = "Experience cannot be negative"))]
    pub experience: Option<i32>,
    /// A list, or a comma separated string.
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub course_ids: Vec<CourseId>,
    pub office_hours: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFacultyDto {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_id: Option<String>,
    /// Replacing the image deletes the previous remote object.
    #[validate(nested)]
    pub image: Option<ImageRef>,
    #[validate(length(min = 1, max = 200))]
    pub specialization: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub qualification: Option<String>,
    #[validate(range(min = 0, max = 70, message = "Experience cannot be negative"))]
    pub experience: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_string_list")]
    pub expertise: Option<Vec<String>>,
    pub course_ids: Option<Vec<CourseId>>,
    pub office_hours: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateFacultyDto {
    /// Merges the supplied fields and returns the public id of a replaced image.
    pub fn apply(self, faculty: &mut Faculty) -> Option<String> {
        let mut replaced = None;
        if let Some(image) = self.image {
            let previous = faculty.image_public_id();
            if previous.as_deref() != Some(image.public_id.as_str()) {
                replaced = previous;
            }
            faculty.image = Some(Json(image));
        }
        if let Some(name) = self.name {
            faculty.name = name;
        }
        if let Some(email) = self.email {
            faculty.email = email.to_lowercase();
        }
        if let Some(employee_id) = self.employee_id {
            faculty.employee_id = employee_id;
        }
        if let Some(specialization) = self.specialization {
            faculty.specialization = specialization;
        }
        if let Some(qualification) = self.qualification {
            faculty.qualification = qualification;
        }
        if let Some(experience) = self.experience {
            faculty.experience = experience;
        }
        if let Some(expertise) = self.expertise {
            faculty.expertise = expertise;
        }
        if let Some(course_ids) = self.course_ids {
            faculty.course_ids = course_ids;
        }
        if let Some(office_hours) = self.office_hours {
            faculty.office_hours = Some(office_hours);
        }
        if let Some(is_active) = self.is_active {
            faculty.is_active = is_active;
        }
        replaced
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FacultyFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Case-insensitive match on name, email or specialization
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
