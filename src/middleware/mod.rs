//! Request extractors for authentication and authorization.
//!
//! - [`auth`]: the [`AuthUser`](auth::AuthUser) extractor plus role-gated
//!   extractors built with `require_role!`
//! - [`role`]: role sets and the `authorize` check
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` (or a `token` cookie)
//! 2. `AuthUser` verifies the JWT and reloads the user; missing or inactive
//!    accounts are rejected with 401
//! 3. Role extractors such as `AdminUser` answer 403 for other roles
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AdminUser, AuthUser};
//!
//! async fn me(auth_user: AuthUser) -> impl IntoResponse { /* any role */ }
//!
//! async fn create_branch(AdminUser(admin): AdminUser) -> impl IntoResponse { /* admins */ }
//! ```

pub mod auth;
pub mod role;
