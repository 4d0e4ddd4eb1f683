//! Registration and login payloads.
//!
//! Registration carries the common account fields plus a profile payload
//! tagged by `role`:
//!
//! ```json
//! { "name": "Asha", "email": "asha@example.com", "password": "secret1",
//!   "role": "student", "guardian_name": "R. Rao" }
//! ```

use crate::ids::{BranchId, UserId};
use crate::users::{User, UserRole};
use crate::validation::validate_phone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AccountFields {
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Ignored for admins. Falls back to the first active branch.
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct StudentProfileInput {
    #[validate(length(max = 100))]
    pub guardian_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub guardian_contact: Option<String>,
    #[validate(length(max = 200))]
    pub qualification: Option<String>,
    #[validate(length(max = 200))]
    pub heard_about_us: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct FacultyProfileInput {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub specialization: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub qualification: String,
    #[validate(range(min = 0, max = 70, message = "Experience cannot be negative"))]
    pub experience: Option<i32>,
}

fn validate_permission_set(permissions: &[String]) -> Result<(), ValidationError> {
    match permissions
        .iter()
        .find(|p| !crate::admins::is_known_permission(p))
    {
        Some(unknown) => {
            let mut err = ValidationError::new("permissions");
            err.message = Some(format!("Unknown permission: {}", unknown).into());
            Err(err)
        }
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AdminProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub department: Option<String>,
    /// Defaults to every permission.
    #[validate(custom(function = "validate_permission_set"))]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub is_super_admin: bool,
}

/// Role-specific part of a registration.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ProfilePayload {
    Student(StudentProfileInput),
    Faculty(FacultyProfileInput),
    Admin(AdminProfileInput),
}

impl ProfilePayload {
    pub const fn role(&self) -> UserRole {
        match self {
            Self::Student(_) => UserRole::Student,
            Self::Faculty(_) => UserRole::Faculty,
            Self::Admin(_) => UserRole::Admin,
        }
    }
}

impl Validate for ProfilePayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Student(input) => input.validate(),
            Self::Faculty(input) => input.validate(),
            Self::Admin(input) => input.validate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub account: AccountFields,
    #[serde(flatten)]
    pub profile: ProfilePayload,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.account.validate()?;
        self.profile.validate()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// The user part of an auth response. Login also reports the branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthUserInfo {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
}

impl AuthUserInfo {
    pub fn from_user(user: &User, with_branch: bool) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            branch_id: if with_branch { user.branch_id } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: AuthUserInfo,
    pub token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_selects_student_profile() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "Asha Rao",
            "email": "asha@example.com",
            "password": "secret1",
            "role": "student",
            "guardian_name": "R. Rao"
        }))
        .unwrap();

        assert_eq!(req.profile.role(), UserRole::Student);
        match req.profile {
            ProfilePayload::Student(input) => {
                assert_eq!(input.guardian_name.as_deref(), Some("R. Rao"))
            }
            other => panic!("unexpected profile {:?}", other),
        }
        assert_eq!(req.account.email, "asha@example.com");
    }

    #[test]
    fn test_register_request_faculty_experience() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "Dr. Iyer",
            "email": "iyer@example.com",
            "password": "secret1",
            "role": "faculty",
            "specialization": "Databases",
            "experience": 7
        }))
        .unwrap();

        match req.profile {
            ProfilePayload::Faculty(input) => {
                assert_eq!(input.experience, Some(7));
                assert_eq!(input.specialization, "Databases");
            }
            other => panic!("unexpected profile {:?}", other),
        }
    }

    #[test]
    fn test_register_request_rejects_unknown_role() {
        let result: Result<RegisterRequest, _> = serde_json::from_value(json!({
            "name": "Someone",
            "email": "someone@example.com",
            "password": "secret1",
            "role": "janitor"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_register_validation_covers_account_and_profile() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "bad",
            "password": "123",
            "role": "student"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));

        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "Admin One",
            "email": "admin@example.com",
            "password": "secret1",
            "role": "admin",
            "permissions": ["launch_rockets"]
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("permissions"));
    }

    #[test]
    fn test_auth_user_info_hides_branch_on_register() {
        let info = AuthUserInfo {
            id: UserId::new(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: UserRole::Student,
            branch_id: None,
        };
        let json = serde_json::to_value(info).unwrap();
        assert!(json.get("branch_id").is_none());
    }
}
