use anyhow::anyhow;
use axum::http::StatusCode;
use collegium_config::StorageConfig;
use collegium_core::{AppError, ImageStorage, StorageError};
use collegium_models::ImageRef;
use tracing::{error, info, instrument};

/// Largest image accepted from a client.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub struct UploadService;

fn storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidFileSize { .. }
        | StorageError::InvalidMimeType { .. }
        | StorageError::InvalidKey(_) => AppError::bad_request(anyhow!(err.to_string())),
        StorageError::IoError(_) | StorageError::Remote(_) => {
            error!(error = %err, "image upload failed");
            AppError::new(StatusCode::BAD_GATEWAY, anyhow!(err.to_string()))
        }
    }
}

/// Upload categories are single path segments such as `events` or `outstanding-students`.
fn check_category(category: &str) -> Result<(), AppError> {
    let valid = !category.is_empty()
        && category.len() <= 50
        && category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request(anyhow!("Invalid upload folder")))
    }
}

impl UploadService {
    #[instrument(skip(storage, config, content), fields(size = content.len()))]
    pub async fn upload_image(
        storage: &dyn ImageStorage,
        config: &StorageConfig,
        category: &str,
        file_name: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<ImageRef, AppError> {
        check_category(category)?;
        if content.is_empty() {
            return Err(AppError::bad_request(anyhow!("Image file is empty")));
        }
        if content.len() > MAX_UPLOAD_BYTES {
            return Err(storage_error(StorageError::InvalidFileSize {
                max_bytes: MAX_UPLOAD_BYTES,
            }));
        }

        let folder = config.folder(category);
        let stored = storage
            .upload(&folder, file_name, content, content_type)
            .await
            .map_err(storage_error)?;
        info!(public_id = %stored.public_id, "image uploaded");
        Ok(ImageRef::from(stored))
    }
}
