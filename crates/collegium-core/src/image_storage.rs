//! Remote image storage abstraction.
//!
//! Entities never hold image bytes: they hold the `{url, public_id}` pair
//! returned by [`ImageStorage::upload`], and hand `public_id` back to
//! [`ImageStorage::delete`] when the image is removed or replaced.
//!
//! Backends:
//!
//! - [`LocalImageStorage`]: files on disk served under a base URL
//! - [`CloudinaryImageStorage`]: Cloudinary's signed upload/destroy REST API
//!
//! # Example
//!
//! ```ignore
//! use collegium_core::image_storage::{ImageStorage, LocalImageStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalImageStorage::new(
//!     PathBuf::from("./uploads"),
//!     "http://localhost:5002/uploads".to_string(),
//! );
//!
//! let stored = storage.upload("collegium/events", "poster.png", &bytes, "image/png").await?;
//! storage.delete(&stored.public_id).await?;
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;
use uuid::Uuid;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// MIME types accepted for uploaded images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// The location of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

/// Abstract trait for image storage backends.
pub trait ImageStorage: Send + Sync {
    /// Store an image under `folder` and return its public URL and identifier.
    fn upload<'a>(
        &'a self,
        folder: &'a str,
        file_name: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> StorageFuture<'a, StoredImage>;

    /// Delete an image by identifier. Deleting a missing image succeeds.
    fn delete<'a>(&'a self, public_id: &'a str) -> StorageFuture<'a, ()>;
}

/// Error type for image storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// File exceeds maximum allowed size.
    InvalidFileSize { max_bytes: usize },

    /// MIME type not allowed.
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    /// I/O error (file system or similar).
    IoError(std::io::Error),

    /// Invalid storage key format.
    InvalidKey(String),

    /// The remote provider rejected the request or could not be reached.
    Remote(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::InvalidMimeType { received, allowed } => {
                write!(
                    f,
                    "MIME type '{}' not allowed. Allowed types: {}",
                    received,
                    allowed.join(", ")
                )
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
            Self::Remote(msg) => write!(f, "Image provider error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        Self::Remote(e.to_string())
    }
}

/// Rejects anything that is not an accepted image type.
pub fn validate_content_type(content_type: &str) -> Result<(), StorageError> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(StorageError::InvalidMimeType {
            received: content_type.to_string(),
            allowed: ALLOWED_IMAGE_TYPES.iter().map(|s| s.to_string()).collect(),
        })
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Local filesystem-based image storage.
#[derive(Clone)]
pub struct LocalImageStorage {
    /// Base directory where files are stored
    base_dir: PathBuf,

    /// Base URL for public file access (e.g., "http://localhost:5002/uploads")
    base_url: String,

    max_file_size: usize,
}

impl LocalImageStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, 5 * 1024 * 1024)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    /// Validate storage key format to prevent path traversal.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\')
        {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

impl ImageStorage for LocalImageStorage {
    fn upload<'a>(
        &'a self,
        folder: &'a str,
        _file_name: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> StorageFuture<'a, StoredImage> {
        Box::pin(async move {
            validate_content_type(content_type)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let key = format!(
                "{}/{}.{}",
                folder.trim_matches('/'),
                Uuid::new_v4(),
                extension_for(content_type)
            );
            Self::validate_key(&key)?;

            let file_path = self.base_dir.join(&key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(StoredImage {
                url: self.url_for(&key),
                public_id: key,
            })
        })
    }

    fn delete<'a>(&'a self, public_id: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(public_id)?;

            match fs::remove_file(self.base_dir.join(public_id)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Cloudinary-backed image storage using signed REST calls.
///
/// Requests are signed with SHA-256 over the alphabetically sorted
/// parameters followed by the API secret, so the account must have
/// SHA-256 signatures enabled.
#[derive(Clone)]
pub struct CloudinaryImageStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
}

#[derive(Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

impl CloudinaryImageStorage {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }

    /// Point the client at a different API host (used against mock servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.api_base.trim_end_matches('/'),
            self.cloud_name,
            action
        )
    }

    /// `sha256("k1=v1&k2=v2" + secret)` with keys sorted alphabetically.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl ImageStorage for CloudinaryImageStorage {
    fn upload<'a>(
        &'a self,
        folder: &'a str,
        file_name: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> StorageFuture<'a, StoredImage> {
        Box::pin(async move {
            validate_content_type(content_type)?;

            let timestamp = Utc::now().timestamp().to_string();
            let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);

            let part = reqwest::multipart::Part::bytes(content.to_vec())
                .file_name(file_name.to_string())
                .mime_str(content_type)?;

            let form = reqwest::multipart::Form::new()
                .part("file", part)
                .text("api_key", self.api_key.clone())
                .text("timestamp", timestamp)
                .text("folder", folder.to_string())
                .text("signature_algorithm", "sha256")
                .text("signature", signature);

            let response = self
                .client
                .post(self.endpoint("upload"))
                .multipart(form)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(StorageError::Remote(format!(
                    "upload failed with {}: {}",
                    status, body
                )));
            }

            let body: CloudinaryUploadResponse = response.json().await?;
            Ok(StoredImage {
                url: body.secure_url,
                public_id: body.public_id,
            })
        })
    }

    fn delete<'a>(&'a self, public_id: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let timestamp = Utc::now().timestamp().to_string();
            let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

            let params = [
                ("public_id", public_id.to_string()),
                ("timestamp", timestamp),
                ("api_key", self.api_key.clone()),
                ("signature_algorithm", "sha256".to_string()),
                ("signature", signature),
            ];

            let response = self
                .client
                .post(self.endpoint("destroy"))
                .form(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(StorageError::Remote(format!(
                    "destroy failed with {}",
                    response.status()
                )));
            }

            let body: CloudinaryDestroyResponse = response.json().await?;
            match body.result.as_str() {
                "ok" | "not found" => Ok(()),
                other => Err(StorageError::Remote(format!("destroy returned '{}'", other))),
            }
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryImageStorage;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-process storage that records every call; deletes can be made to fail.
    #[derive(Clone, Default)]
    pub struct MemoryImageStorage {
        stored: Arc<Mutex<BTreeSet<String>>>,
        deleted: Arc<Mutex<Vec<String>>>,
        fail_deletes: Arc<AtomicBool>,
    }

    impl MemoryImageStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_deletes(&self, fail: bool) {
            self.fail_deletes.store(fail, Ordering::SeqCst);
        }

        /// Every `public_id` a delete was attempted for, in call order.
        pub fn delete_attempts(&self) -> Vec<String> {
            self.deleted
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        pub fn contains(&self, public_id: &str) -> bool {
            self.stored
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains(public_id)
        }
    }

    impl ImageStorage for MemoryImageStorage {
        fn upload<'a>(
            &'a self,
            folder: &'a str,
            _file_name: &'a str,
            content: &'a [u8],
            content_type: &'a str,
        ) -> StorageFuture<'a, StoredImage> {
            Box::pin(async move {
                validate_content_type(content_type)?;
                if content.is_empty() {
                    return Err(StorageError::InvalidFileSize { max_bytes: 0 });
                }
                let public_id = format!("{}/{}", folder, Uuid::new_v4());
                self.stored
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(public_id.clone());
                Ok(StoredImage {
                    url: format!("https://images.test/{}", public_id),
                    public_id,
                })
            })
        }

        fn delete<'a>(&'a self, public_id: &'a str) -> StorageFuture<'a, ()> {
            Box::pin(async move {
                self.deleted
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(public_id.to_string());
                if self.fail_deletes.load(Ordering::SeqCst) {
                    return Err(StorageError::Remote("simulated outage".to_string()));
                }
                self.stored
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(public_id);
                Ok(())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalImageStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("collegium-test-{}", Uuid::new_v4()));
        (
            LocalImageStorage::new(dir.clone(), "http://localhost:5002/uploads/".to_string()),
            dir,
        )
    }

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(LocalImageStorage::validate_key("collegium/events/abc-123.png").is_ok());
        assert!(LocalImageStorage::validate_key("faculty/profile_pic.webp").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_path_traversal() {
        assert!(LocalImageStorage::validate_key("../../../etc/passwd").is_err());
        assert!(LocalImageStorage::validate_key("..\\windows\\system32").is_err());
    }

    #[test]
    fn test_validate_key_rejects_absolute_paths() {
        assert!(LocalImageStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalImageStorage::validate_key("\\windows\\system32").is_err());
    }

    #[test]
    fn test_validate_content_type() {
        assert!(validate_content_type("image/png").is_ok());
        assert!(matches!(
            validate_content_type("application/pdf"),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_upload_and_delete() {
        let (storage, dir) = temp_storage();
        let stored = storage
            .upload("collegium/events", "poster.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        assert!(stored.public_id.starts_with("collegium/events/"));
        assert!(stored.public_id.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("http://localhost:5002/uploads/{}", stored.public_id)
        );
        assert!(dir.join(&stored.public_id).exists());

        storage.delete(&stored.public_id).await.unwrap();
        assert!(!dir.join(&stored.public_id).exists());

        // Deleting again is a no-op.
        storage.delete(&stored.public_id).await.unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_local_upload_rejects_oversized_file() {
        let dir = std::env::temp_dir().join(format!("collegium-test-{}", Uuid::new_v4()));
        let storage = LocalImageStorage::with_max_size(dir, "http://x".to_string(), 4);
        let result = storage
            .upload("faculty", "a.png", b"too large", "image/png")
            .await;
        assert!(matches!(
            result,
            Err(StorageError::InvalidFileSize { max_bytes: 4 })
        ));
    }

    #[test]
    fn test_cloudinary_signature_is_order_independent() {
        let storage = CloudinaryImageStorage::new(
            "demo".to_string(),
            "key".to_string(),
            "secret".to_string(),
        );
        let a = storage.sign(&[("timestamp", "1700000000"), ("folder", "collegium/events")]);
        let b = storage.sign(&[("folder", "collegium/events"), ("timestamp", "1700000000")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cloudinary_endpoint() {
        let storage = CloudinaryImageStorage::new(
            "demo".to_string(),
            "key".to_string(),
            "secret".to_string(),
        )
        .with_api_base("http://mock.local/v1_1/");
        assert_eq!(
            storage.endpoint("destroy"),
            "http://mock.local/v1_1/demo/image/destroy"
        );
    }

    #[tokio::test]
    async fn test_memory_storage_records_failed_deletes() {
        let storage = MemoryImageStorage::new();
        storage.set_fail_deletes(true);
        assert!(storage.delete("events/a").await.is_err());
        assert_eq!(storage.delete_attempts(), vec!["events/a".to_string()]);
    }
}
