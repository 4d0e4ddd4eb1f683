//! # Collegium Models
//!
//! Domain models and DTOs for the Collegium API.
//!
//! Entities derive `sqlx::FromRow` and map 1:1 onto the tables in
//! `migrations/`; request DTOs carry `validator` rules; everything exposed
//! over HTTP derives `utoipa::ToSchema`.
//!
//! # Modules
//!
//! - [`ids`]: Uuid newtypes per entity
//! - [`users`], [`students`], [`faculty`], [`admins`]: identities and role sub-profiles
//! - [`auth`]: registration (role-tagged profile payload) and login
//! - [`profile`]: merged user + sub-profile view
//! - [`branches`], [`courses`], [`events`]: academic structure
//! - [`outstanding_students`], [`testimonials`], [`inquiries`]: public site content
//! - [`images`]: remote image references

pub mod admins;
pub mod auth;
pub mod branches;
pub mod courses;
pub mod events;
pub mod faculty;
pub mod ids;
pub mod images;
pub mod inquiries;
pub mod outstanding_students;
pub mod profile;
pub mod students;
pub mod testimonials;
pub mod users;
pub mod validation;

pub use ids::*;
pub use images::{BranchImage, GalleryImage, ImageRef, PendingImageDeletion};
pub use users::{User, UserRole, UserSummary};
