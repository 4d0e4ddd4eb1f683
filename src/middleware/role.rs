//! Role sets used by the authorization extractors.
//!
//! Roles nest: every admin may do what faculty may do, and faculty and
//! admins may do what students may do.

use collegium_core::AppError;
use collegium_models::UserRole;

use crate::middleware::auth::AuthUser;

pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];
pub const FACULTY_ROLES: &[UserRole] = &[UserRole::Faculty, UserRole::Admin];
pub const STUDENT_ROLES: &[UserRole] = &[UserRole::Student, UserRole::Faculty, UserRole::Admin];

/// 403 unless the caller's role is one of `roles`.
pub fn authorize(auth_user: &AuthUser, roles: &[UserRole]) -> Result<(), AppError> {
    if roles.contains(&auth_user.role()) {
        return Ok(());
    }
    Err(AppError::forbidden(format!(
        "User role '{}' is not authorized to access this route",
        auth_user.role()
    )))
}

pub fn is_admin(role: UserRole) -> bool {
    ADMIN_ROLES.contains(&role)
}

pub fn is_faculty(role: UserRole) -> bool {
    FACULTY_ROLES.contains(&role)
}

pub fn is_student(role: UserRole) -> bool {
    STUDENT_ROLES.contains(&role)
}
