use anyhow::anyhow;
use async_trait::async_trait;
use collegium_core::AppError;
use collegium_models::admins::{Admin, NewAdmin};
use collegium_models::faculty::NewFaculty;
use collegium_models::students::NewStudent;
use collegium_models::users::NewUser;
use collegium_models::{AdminId, BranchId, FacultyId, StudentId, User, UserId, UserRole};
use sqlx::types::Json;

use crate::store::PgStore;
use crate::store::postgres::{profile_number_violation, unique_violation};

/// Role-specific row created together with a user.
#[derive(Debug, Clone)]
pub enum NewProfile {
    Student(NewStudent),
    Faculty(NewFaculty),
    Admin(NewAdmin),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;
    /// Case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError>;
    /// Inserts the user and its sub-profile atomically.
    async fn create_with_profile(
        &self,
        user: NewUser,
        profile: NewProfile,
    ) -> Result<User, AppError>;
    /// Saves the mutable account fields.
    async fn update(&self, user: &User) -> Result<User, AppError>;
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AppError>;
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, AppError>;
    async fn count_by_branch(&self, branch_id: BranchId) -> Result<i64, AppError>;
    async fn count_by_role(&self, role: UserRole) -> Result<i64, AppError>;
    async fn find_admin_profile(&self, user_id: UserId) -> Result<Option<Admin>, AppError>;
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.pool())
            .await?;
        Ok(users)
    }

    async fn create_with_profile(
        &self,
        user: NewUser,
        profile: NewProfile,
    ) -> Result<User, AppError> {
        let mut tx = self.pool().begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, phone, address, branch_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.branch_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Email already registered"))?;

        match profile {
            NewProfile::Student(student) => {
                sqlx::query(
                    r#"
                    INSERT INTO students (id, user_id, student_id, roll_number, admission_year,
                        guardian_name, guardian_contact, qualification, heard_about_us)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(StudentId::new())
                .bind(created.id)
                .bind(&student.student_id)
                .bind(&student.roll_number)
                .bind(student.admission_year)
                .bind(&student.guardian_name)
                .bind(&student.guardian_contact)
                .bind(&student.qualification)
                .bind(&student.heard_about_us)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    profile_number_violation(
                        e,
                        "students_student_id_key",
                        "Student id already exists",
                    )
                })?;
            }
            NewProfile::Faculty(faculty) => {
                sqlx::query(
                    r#"
                    INSERT INTO faculty (id, user_id, employee_id, name, email, image,
                        specialization, qualification, experience, expertise, course_ids, office_hours)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(FacultyId::new())
                .bind(created.id)
                .bind(&faculty.employee_id)
                .bind(&faculty.name)
                .bind(&faculty.email)
                .bind(faculty.image.map(Json))
                .bind(&faculty.specialization)
                .bind(&faculty.qualification)
                .bind(faculty.experience)
                .bind(&faculty.expertise)
                .bind(&faculty.course_ids)
                .bind(&faculty.office_hours)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    profile_number_violation(
                        e,
                        "faculty_employee_id_key",
                        "Employee id already exists",
                    )
                })?;
            }
            NewProfile::Admin(admin) => {
                sqlx::query(
                    r#"
                    INSERT INTO admins (id, user_id, admin_id, department, permissions, is_super_admin)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(AdminId::new())
                .bind(created.id)
                .bind(&admin.admin_id)
                .bind(&admin.department)
                .bind(&admin.permissions)
                .bind(admin.is_super_admin)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    profile_number_violation(
                        e,
                        "admins_admin_id_key",
                        "Admin id already exists",
                    )
                })?;
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, phone = $3, address = $4, profile_picture = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.profile_picture)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
        Ok(updated)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn count_by_branch(&self, branch_id: BranchId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE branch_id = $1")
            .bind(branch_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn find_admin_profile(&self, user_id: UserId) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(admin)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::utils::profile_number::ProfileNumberTaken;
    use chrono::Utc;
    use collegium_models::faculty::Faculty;
    use collegium_models::students::Student;

    fn duplicate(message: &str) -> AppError {
        AppError::bad_request(anyhow!(message.to_string()))
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
            Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            let email = email.trim().to_lowercase();
            Ok(self
                .lock()
                .users
                .iter()
                .find(|u| u.email.to_lowercase() == email)
                .cloned())
        }

        async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
            Ok(self
                .lock()
                .users
                .iter()
                .filter(|u| ids.contains(&u.id))
                .cloned()
                .collect())
        }

        async fn create_with_profile(
            &self,
            user: NewUser,
            profile: NewProfile,
        ) -> Result<User, AppError> {
            let mut tables = self.lock();
            let email = user.email.to_lowercase();
            if tables.users.iter().any(|u| u.email.to_lowercase() == email) {
                return Err(duplicate("Email already registered"));
            }

            let now = Utc::now();
            let created = User {
                id: UserId::new(),
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                phone: user.phone,
                address: user.address,
                profile_picture: None,
                branch_id: user.branch_id,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            match profile {
                NewProfile::Student(student) => {
                    if tables
                        .students
                        .iter()
                        .any(|s| s.student_id == student.student_id)
                    {
                        return Err(ProfileNumberTaken("Student id already exists").into());
                    }
                    tables.students.push(Student {
                        id: StudentId::new(),
                        user_id: created.id,
                        student_id: student.student_id,
                        roll_number: student.roll_number,
                        admission_year: student.admission_year,
                        current_semester: 1,
                        gpa: 0.0,
                        attendance: 0.0,
                        guardian_name: student.guardian_name,
                        guardian_contact: student.guardian_contact,
                        qualification: student.qualification,
                        heard_about_us: student.heard_about_us,
                        blood_group: None,
                        is_outstanding: false,
                        achievements: Json(Vec::new()),
                        enrolled_course_ids: Vec::new(),
                        created_at: now,
                        updated_at: now,
                    });
                }
                NewProfile::Faculty(faculty) => {
                    if tables
                        .faculty
                        .iter()
                        .any(|f| f.employee_id == faculty.employee_id)
                    {
                        return Err(ProfileNumberTaken("Employee id already exists").into());
                    }
                    tables.faculty.push(Faculty {
                        id: FacultyId::new(),
                        user_id: Some(created.id),
                        employee_id: faculty.employee_id,
                        name: faculty.name,
                        email: faculty.email,
                        image: faculty.image.map(Json),
                        specialization: faculty.specialization,
                        qualification: faculty.qualification,
                        experience: faculty.experience,
                        expertise: faculty.expertise,
                        course_ids: faculty.course_ids,
                        office_hours: faculty.office_hours,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    });
                }
                NewProfile::Admin(admin) => {
                    if tables.admins.iter().any(|a| a.admin_id == admin.admin_id) {
                        return Err(ProfileNumberTaken("Admin id already exists").into());
                    }
                    tables.admins.push(Admin {
                        id: AdminId::new(),
                        user_id: created.id,
                        admin_id: admin.admin_id,
                        department: admin.department,
                        permissions: admin.permissions,
                        is_super_admin: admin.is_super_admin,
                        created_at: now,
                        updated_at: now,
                    });
                }
            }

            tables.users.push(created.clone());
            Ok(created)
        }

        async fn update(&self, user: &User) -> Result<User, AppError> {
            let mut tables = self.lock();
            let stored = tables
                .users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
            stored.name = user.name.clone();
            stored.phone = user.phone.clone();
            stored.address = user.address.clone();
            stored.profile_picture = user.profile_picture.clone();
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        }

        async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AppError> {
            if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
            }
            Ok(())
        }

        async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, AppError> {
            let mut tables = self.lock();
            Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                user.clone()
            }))
        }

        async fn count_by_branch(&self, branch_id: BranchId) -> Result<i64, AppError> {
            Ok(self
                .lock()
                .users
                .iter()
                .filter(|u| u.branch_id == Some(branch_id))
                .count() as i64)
        }

        async fn count_by_role(&self, role: UserRole) -> Result<i64, AppError> {
            Ok(self.lock().users.iter().filter(|u| u.role == role).count() as i64)
        }

        async fn find_admin_profile(&self, user_id: UserId) -> Result<Option<Admin>, AppError> {
            Ok(self
                .lock()
                .admins
                .iter()
                .find(|a| a.user_id == user_id)
                .cloned())
        }
    }
}
