//! Showcase records for alumni placed at notable companies.

use crate::ids::OutstandingStudentId;
use crate::images::ImageRef;
use crate::validation::{deserialize_optional_string_list, deserialize_string_list};
use chrono::{DateTime, Utc};
use collegium_core::serde::deserialize_optional_bool;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OutstandingStudent {
    pub id: OutstandingStudentId,
    pub rank: i32,
    pub name: String,
    #[schema(value_type = ImageRef)]
    pub image: Json<ImageRef>,
    pub college: String,
    pub company: String,
    pub role: String,
    pub package: String,
    pub skills: Vec<String>,
    pub achievement: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOutstandingStudentDto {
    #[validate(range(min = 1, message = "Rank must be at least 1"))]
    pub rank: i32,
    #[validate(length(min = 2, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(nested)]
    pub image: ImageRef,
    #[validate(length(min = 1, max = 200, message = "College is required"))]
    pub college: String,
    #[validate(length(min = 1, max = 200, message = "Company is required"))]
    pub company: String,
    #[validate(length(min = 1, max = 200, message = "Role is required"))]
    pub role: String,
    #[validate(length(min = 1, max = 50, message = "Package is required"))]
    pub package: String,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub skills: Vec<String>,
    #[validate(length(max = 1000))]
    pub achievement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOutstandingStudentDto {
    #[validate(range(min = 1, message = "Rank must be at least 1"))]
    pub rank: Option<i32>,
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(nested)]
    pub image: Option<ImageRef>,
    #[validate(length(min = 1, max = 200))]
    pub college: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub role: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub package: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string_list")]
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 1000))]
    pub achievement: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateOutstandingStudentDto {
    /// Merges the supplied fields and returns the public id of a replaced image.
    pub fn apply(self, record: &mut OutstandingStudent) -> Option<String> {
        let mut replaced = None;
        if let Some(image) = self.image {
            if record.image.public_id != image.public_id {
                replaced = Some(record.image.public_id.clone());
            }
            record.image = Json(image);
        }
        if let Some(rank) = self.rank {
            record.rank = rank;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(college) = self.college {
            record.college = college;
        }
        if let Some(company) = self.company {
            record.company = company;
        }
        if let Some(role) = self.role {
            record.role = role;
        }
        if let Some(package) = self.package {
            record.package = package;
        }
        if let Some(skills) = self.skills {
            record.skills = skills;
        }
        if let Some(achievement) = self.achievement {
            record.achievement = Some(achievement);
        }
        if let Some(is_active) = self.is_active {
            record.is_active = is_active;
        }
        replaced
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveFilterParams {
    /// Only records with this active flag
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_rank_zero() {
        let dto: CreateOutstandingStudentDto = serde_json::from_value(serde_json::json!({
            "rank": 0,
            "name": "Ravi Kumar",
            "image": {"url": "https://cdn.example.com/r.png", "public_id": "outstanding/r"},
            "college": "Collegium",
            "company": "Acme",
            "role": "SDE",
            "package": "12 LPA",
            "skills": "Rust, Go"
        }))
        .unwrap();
        assert_eq!(dto.skills, vec!["Rust", "Go"]);
        assert!(dto.validate().is_err());
    }
}
