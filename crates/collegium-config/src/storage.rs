//! Image storage configuration.
//!
//! - `IMAGE_STORAGE`: `cloudinary` or `local` (default: `local`)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
//! - `CLOUDINARY_FOLDER`: root folder for uploads (default: `collegium`)
//! - `UPLOAD_DIR` / `UPLOAD_BASE_URL`: local backend location and public URL

use std::env;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Cloudinary {
        cloud_name: String,
        api_key: String,
        api_secret: String,
    },
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub root_folder: String,
    pub upload_dir: String,
    pub upload_base_url: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let backend = match env::var("IMAGE_STORAGE").as_deref() {
            Ok("cloudinary") => StorageBackend::Cloudinary {
                cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
                api_secret: env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
            },
            _ => StorageBackend::Local,
        };

        Self {
            backend,
            root_folder: env_or("CLOUDINARY_FOLDER", "collegium".to_string()),
            upload_dir: env_or("UPLOAD_DIR", "storage/uploads".to_string()),
            upload_base_url: env_or(
                "UPLOAD_BASE_URL",
                "http://localhost:5002/uploads".to_string(),
            ),
        }
    }

    /// Full provider folder for an upload category, e.g. `collegium/events`.
    pub fn folder(&self, category: &str) -> String {
        format!("{}/{}", self.root_folder.trim_end_matches('/'), category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_joins_root() {
        let config = StorageConfig {
            backend: StorageBackend::Local,
            root_folder: "collegium/".to_string(),
            upload_dir: "x".to_string(),
            upload_base_url: "y".to_string(),
        };
        assert_eq!(config.folder("events"), "collegium/events");
    }
}
