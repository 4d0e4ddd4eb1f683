//! Merged profile view: the base user plus the sub-profile matching its role.

use crate::admins::Admin;
use crate::branches::BranchSummary;
use crate::courses::CourseSummary;
use crate::faculty::Faculty;
use crate::students::Student;
use crate::users::User;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentProfileDetails {
    #[serde(flatten)]
    pub student: Student,
    pub enrolled_courses: Vec<CourseSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FacultyProfileDetails {
    #[serde(flatten)]
    pub faculty: Faculty,
    pub courses: Vec<CourseSummary>,
}

/// At most one of the `*_details` fields is set. All are `null` when the
/// sub-profile row is missing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub branch: Option<BranchSummary>,
    pub student_details: Option<StudentProfileDetails>,
    pub faculty_details: Option<FacultyProfileDetails>,
    pub admin_details: Option<Admin>,
}

impl UserProfile {
    pub fn base(user: User, branch: Option<BranchSummary>) -> Self {
        Self {
            user,
            branch,
            student_details: None,
            faculty_details: None,
            admin_details: None,
        }
    }
}
