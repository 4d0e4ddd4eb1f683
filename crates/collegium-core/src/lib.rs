//! # Collegium Core
//!
//! Core types, errors, and utilities for the Collegium API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page-based pagination parameters and metadata
//! - [`response`]: The `{ success, message, data }` response envelope
//! - [`password`]: bcrypt password hashing and verification
//! - [`image_storage`]: Remote image storage abstraction with local and Cloudinary backends
//! - [`serde`]: Query-string deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use collegium_core::errors::AppError;
//! use collegium_core::pagination::PaginationParams;
//! use collegium_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Branch not found"));
//! let hash = hash_password("secure_password")?;
//! let params = PaginationParams::default();
//! ```

pub mod errors;
pub mod image_storage;
pub mod pagination;
pub mod password;
pub mod response;
pub mod serde;

pub use errors::AppError;
pub use image_storage::{ImageStorage, StorageError, StoredImage};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use response::{ApiResponse, MessageResponse, PaginatedResponse};
