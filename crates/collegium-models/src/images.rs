//! Remote image references stored on entities.

use chrono::{DateTime, Utc};
use collegium_core::StoredImage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A `{url, public_id}` pair returned by the image store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImageRef {
    #[validate(length(min = 1, message = "Image url is required"))]
    pub url: String,
    #[validate(length(min = 1, message = "Image public_id is required"))]
    pub public_id: String,
}

impl From<StoredImage> for ImageRef {
    fn from(image: StoredImage) -> Self {
        Self {
            url: image.url,
            public_id: image.public_id,
        }
    }
}

/// Branch photo with its upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BranchImage {
    pub url: String,
    pub public_id: String,
    pub uploaded_at: DateTime<Utc>,
}

impl BranchImage {
    pub fn from_ref(image: ImageRef, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            url: image.url,
            public_id: image.public_id,
            uploaded_at,
        }
    }
}

/// Event gallery photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GalleryImage {
    pub url: String,
    pub public_id: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Remote object whose deletion failed and is waiting for a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PendingImageDeletion {
    pub public_id: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddImagesDto {
    #[validate(length(min = 1, max = 10, message = "Provide between 1 and 10 images"), nested)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddGalleryImageDto {
    #[validate(nested)]
    pub image: ImageRef,
    #[validate(length(max = 200))]
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_requires_both_fields() {
        let image = ImageRef {
            url: "https://cdn.example.com/a.png".to_string(),
            public_id: "collegium/branches/a".to_string(),
        };
        assert!(image.validate().is_ok());

        let missing_id = ImageRef {
            public_id: String::new(),
            ..image
        };
        assert!(missing_id.validate().is_err());
    }

    #[test]
    fn test_add_images_limits() {
        let image = ImageRef {
            url: "u".to_string(),
            public_id: "p".to_string(),
        };
        assert!(AddImagesDto { images: vec![] }.validate().is_err());
        assert!(AddImagesDto { images: vec![image.clone(); 10] }.validate().is_ok());
        assert!(AddImagesDto { images: vec![image; 11] }.validate().is_err());
    }
}
