use crate::ids::TestimonialId;
use crate::images::ImageRef;
use chrono::{DateTime, Utc};
use collegium_core::serde::{deserialize_optional_bool, deserialize_optional_i64};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_RATING: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Testimonial {
    pub id: TestimonialId,
    pub name: String,
    pub title: Option<String>,
    pub role: Option<String>,
    pub description: String,
    #[schema(value_type = ImageRef)]
    pub image: Json<ImageRef>,
    pub rating: i32,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTestimonialDto {
    #[validate(length(min = 2, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 150))]
    pub role: Option<String>,
    #[validate(length(min = 10, max = 2000, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(nested)]
    pub image: ImageRef,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTestimonialDto {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 150))]
    pub role: Option<String>,
    #[validate(length(min = 10, max = 2000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub image: Option<ImageRef>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateTestimonialDto {
    /// Merges the supplied fields and returns the public id of a replaced image.
    pub fn apply(self, testimonial: &mut Testimonial) -> Option<String> {
        let mut replaced = None;
        if let Some(image) = self.image {
            if testimonial.image.public_id != image.public_id {
                replaced = Some(testimonial.image.public_id.clone());
            }
            testimonial.image = Json(image);
        }
        if let Some(name) = self.name {
            testimonial.name = name;
        }
        if let Some(title) = self.title {
            testimonial.title = Some(title);
        }
        if let Some(role) = self.role {
            testimonial.role = Some(role);
        }
        if let Some(description) = self.description {
            testimonial.description = description;
        }
        if let Some(rating) = self.rating {
            testimonial.rating = rating;
        }
        if let Some(order) = self.display_order {
            testimonial.display_order = order;
        }
        if let Some(is_active) = self.is_active {
            testimonial.is_active = is_active;
        }
        replaced
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TestimonialFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Maximum number of testimonials to return
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let dto = UpdateTestimonialDto {
            rating: Some(6),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateTestimonialDto {
            rating: Some(1),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }
}
