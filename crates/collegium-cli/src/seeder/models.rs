//! Seed rows and seeding configuration.

use collegium_models::{BranchId, CourseId, UserId, UserRole};

/// Every seeded branch code starts with this, so seeded rows can be cleared.
pub const SEED_BRANCH_PREFIX: &str = "SD";
/// Domain of every seeded email address.
pub const SEED_EMAIL_DOMAIN: &str = "seed.collegium.test";
/// Password shared by all seeded accounts.
pub const SEED_PASSWORD: &str = "password123";

pub struct BranchSeed {
    pub id: BranchId,
    pub branch_name: String,
    pub branch_code: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub contact_phone: String,
    pub total_seats: i32,
    pub established_year: i32,
}

pub struct CourseSeed {
    pub id: CourseId,
    pub course_name: String,
    pub course_code: String,
    pub description: String,
    pub duration: String,
    pub branch_id: BranchId,
    pub credits: i32,
    pub semester: i32,
}

pub struct UserSeed {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: String,
    pub branch_id: Option<BranchId>,
}

pub struct StudentSeed {
    pub user_id: UserId,
    pub student_id: String,
    pub roll_number: String,
    pub admission_year: i32,
    pub current_semester: i32,
    pub gpa: f64,
    pub attendance: f64,
    pub guardian_name: String,
    pub guardian_contact: String,
}

pub struct FacultySeed {
    pub user_id: UserId,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub qualification: String,
    pub experience: i32,
}

/// How many rows to generate for each seeded branch.
#[derive(Clone)]
pub struct PerBranch {
    pub courses: usize,
    pub faculty: usize,
    pub students: usize,
}

impl Default for PerBranch {
    fn default() -> Self {
        Self {
            courses: 8,
            faculty: 4,
            students: 40,
        }
    }
}

#[derive(Clone, Default)]
pub struct SeedConfig {
    pub num_branches: usize,
    pub per_branch: PerBranch,
}

impl SeedConfig {
    pub fn new(num_branches: usize) -> Self {
        Self {
            num_branches,
            ..Default::default()
        }
    }

    pub fn with_courses(mut self, courses: usize) -> Self {
        self.per_branch.courses = courses;
        self
    }

    pub fn with_faculty(mut self, faculty: usize) -> Self {
        self.per_branch.faculty = faculty;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.per_branch.students = students;
        self
    }

    /// Accounts created across all branches (faculty + students).
    pub fn total_users(&self) -> usize {
        self.num_branches * (self.per_branch.faculty + self.per_branch.students)
    }
}
