use anyhow::anyhow;
use chrono::{Datelike, Utc};
use collegium_auth::{TokenPair, issue_token_pair, verify_refresh_token};
use collegium_config::JwtConfig;
use collegium_core::{AppError, hash_password, verify_password};
use collegium_models::admins::{DEFAULT_DEPARTMENT, NewAdmin, default_permissions};
use collegium_models::auth::{
    AuthResponse, AuthUserInfo, LoginRequest, ProfilePayload, RefreshTokenRequest,
    RegisterRequest,
};
use collegium_models::faculty::NewFaculty;
use collegium_models::ids::{ADMIN_NUMBER_PREFIX, FACULTY_NUMBER_PREFIX, STUDENT_NUMBER_PREFIX};
use collegium_models::students::NewStudent;
use collegium_models::users::{ChangePasswordDto, NewUser, UpdateProfileDto};
use collegium_models::{BranchId, User, UserId, UserRole};
use collegium_observability::{track_jwt_issued, track_login, track_user_registered};
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::is_admin;
use crate::modules::users::repository::NewProfile;
use crate::store::Repositories;
use crate::utils::profile_number::with_profile_number;

pub struct AuthService;

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials")
}

fn number_prefix(role: UserRole) -> &'static str {
    match role {
        UserRole::Student => STUDENT_NUMBER_PREFIX,
        UserRole::Faculty => FACULTY_NUMBER_PREFIX,
        UserRole::Admin => ADMIN_NUMBER_PREFIX,
    }
}

/// Builds the sub-profile row for a new account of `user`, identified by
/// the generated `number`.
fn build_profile(profile: ProfilePayload, user: &NewUser, number: String) -> NewProfile {
    let now = Utc::now();
    match profile {
        ProfilePayload::Student(input) => NewProfile::Student(NewStudent {
            student_id: number,
            roll_number: format!("{}{}", now.year(), rand::thread_rng().gen_range(0..=9999)),
            admission_year: now.year(),
            guardian_name: input.guardian_name,
            guardian_contact: input.guardian_contact,
            qualification: input.qualification,
            heard_about_us: input.heard_about_us,
        }),
        ProfilePayload::Faculty(input) => NewProfile::Faculty(NewFaculty {
            user_id: None,
            employee_id: number,
            name: user.name.clone(),
            email: user.email.clone(),
            image: None,
            specialization: input.specialization,
            qualification: input.qualification,
            experience: input.experience.unwrap_or(0),
            expertise: Vec::new(),
            course_ids: Vec::new(),
            office_hours: None,
        }),
        ProfilePayload::Admin(input) => NewProfile::Admin(NewAdmin {
            admin_id: number,
            department: input
                .department
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
            permissions: input.permissions.unwrap_or_else(default_permissions),
            is_super_admin: input.is_super_admin,
        }),
    }
}

impl AuthService {
    fn tokens_for(user: &User, jwt_config: &JwtConfig) -> Result<TokenPair, AppError> {
        let pair = issue_token_pair(user.id.into_inner(), user.role.as_str(), jwt_config)?;
        track_jwt_issued();
        Ok(pair)
    }

    /// Admin accounts can be self-registered only until the first admin
    /// exists; after that only an admin may create another.
    async fn check_admin_registration(
        repos: &Repositories,
        caller: Option<&AuthUser>,
    ) -> Result<(), AppError> {
        if caller.is_some_and(|c| is_admin(c.role())) {
            return Ok(());
        }
        if repos.users.count_by_role(UserRole::Admin).await? > 0 {
            warn!("admin registration refused");
            return Err(AppError::forbidden(
                "Only administrators can create admin accounts",
            ));
        }
        Ok(())
    }

    async fn resolve_branch(
        repos: &Repositories,
        requested: Option<BranchId>,
    ) -> Result<BranchId, AppError> {
        match requested {
            Some(id) => repos
                .branches
                .find_by_id(id)
                .await?
                .map(|b| b.id)
                .ok_or_else(|| AppError::bad_request(anyhow!("Branch not found"))),
            None => repos
                .branches
                .find_first_active()
                .await?
                .map(|b| b.id)
                .ok_or_else(|| AppError::bad_request(anyhow!("No active branch available"))),
        }
    }

    #[instrument(skip(repos, jwt_config, caller, dto), fields(user.role = %dto.profile.role()))]
    pub async fn register(
        repos: &Repositories,
        jwt_config: &JwtConfig,
        caller: Option<&AuthUser>,
        dto: RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        let RegisterRequest { account, profile } = dto;
        let role = profile.role();

        if role == UserRole::Admin {
            Self::check_admin_registration(repos, caller).await?;
        }

        let email = account.email.trim().to_lowercase();
        if repos.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request(anyhow!("Email already registered")));
        }

        let branch_id = match role {
            UserRole::Admin => None,
            UserRole::Student | UserRole::Faculty => {
                Some(Self::resolve_branch(repos, account.branch_id).await?)
            }
        };

        let new_user = NewUser {
            name: account.name.trim().to_string(),
            email,
            password_hash: hash_password(&account.password)?,
            role,
            phone: account.phone,
            address: account.address,
            branch_id,
        };
        let users = &repos.users;
        let user = with_profile_number(number_prefix(role), move |number| {
            let new_profile = build_profile(profile.clone(), &new_user, number);
            users.create_with_profile(new_user.clone(), new_profile)
        })
        .await?;

        info!(user.id = %user.id, user.role = %user.role, "user registered");
        track_user_registered(user.role.as_str());

        let tokens = Self::tokens_for(&user, jwt_config)?;
        Ok(AuthResponse {
            user: AuthUserInfo::from_user(&user, false),
            token: tokens.token,
            refresh_token: tokens.refresh_token,
        })
    }

    #[instrument(skip(repos, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        repos: &Repositories,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<AuthResponse, AppError> {
        let user = repos
            .users
            .find_by_email(&dto.email)
            .await?
            .ok_or_else(|| {
                track_login("failure");
                invalid_credentials()
            })?;

        if !verify_password(&dto.password, &user.password_hash)? {
            warn!(user.id = %user.id, "failed login attempt");
            track_login("failure");
            return Err(invalid_credentials());
        }

        if !user.is_active {
            track_login("inactive");
            return Err(AppError::unauthorized("Account is inactive"));
        }

        let tokens = Self::tokens_for(&user, jwt_config)?;
        track_login("success");
        info!(user.id = %user.id, "user logged in");
        Ok(AuthResponse {
            user: AuthUserInfo::from_user(&user, true),
            token: tokens.token,
            refresh_token: tokens.refresh_token,
        })
    }

    #[instrument(skip(repos, jwt_config, dto))]
    pub async fn refresh(
        repos: &Repositories,
        jwt_config: &JwtConfig,
        dto: RefreshTokenRequest,
    ) -> Result<TokenPair, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user = repos
            .users
            .find_by_id(UserId::from_uuid(claims.sub))
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;
        if !user.is_active {
            return Err(AppError::unauthorized("Account is inactive"));
        }
        Self::tokens_for(&user, jwt_config)
    }

    #[instrument(skip(repos, user, dto), fields(user.id = %user.id))]
    pub async fn change_password(
        repos: &Repositories,
        user: &User,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        if !verify_password(&dto.current_password, &user.password_hash)? {
            return Err(AppError::bad_request(anyhow!(
                "Current password is incorrect"
            )));
        }
        let password_hash = hash_password(&dto.new_password)?;
        repos.users.update_password(user.id, &password_hash).await?;
        info!("password changed");
        Ok(())
    }

    #[instrument(skip(repos, user, dto), fields(user.id = %user.id))]
    pub async fn update_profile(
        repos: &Repositories,
        mut user: User,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        dto.apply(&mut user);
        repos.users.update(&user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use collegium_auth::{Claims, verify_token};
    use collegium_models::auth::{AccountFields, AdminProfileInput, StudentProfileInput};

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_for_testing_purposes".to_string(),
            refresh_secret: "test_refresh_secret_for_testing".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 7200,
        }
    }

    fn account(email: &str) -> AccountFields {
        AccountFields {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            phone: None,
            address: None,
            branch_id: None,
        }
    }

    fn student(email: &str) -> RegisterRequest {
        RegisterRequest {
            account: account(email),
            profile: ProfilePayload::Student(StudentProfileInput::default()),
        }
    }

    fn admin(email: &str) -> RegisterRequest {
        RegisterRequest {
            account: account(email),
            profile: ProfilePayload::Admin(AdminProfileInput::default()),
        }
    }

    async fn with_branch() -> Repositories {
        let repos = Repositories::from_memory(MemoryStore::new());
        repos.branches.ensure_default().await.unwrap();
        repos
    }

    #[tokio::test]
    async fn test_register_student_uses_default_branch() {
        let repos = with_branch().await;
        let config = jwt_config();
        let response = AuthService::register(&repos, &config, None, student("Asha@Example.com"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "asha@example.com");
        assert!(response.user.branch_id.is_none());
        let claims: Claims = verify_token(&response.token, &config).unwrap();
        assert_eq!(claims.role, "student");

        let user = repos.users.find_by_id(response.user.id).await.unwrap().unwrap();
        assert!(user.branch_id.is_some());
        let profile = repos.students.find_by_user_id(user.id).await.unwrap().unwrap();
        assert!(profile.student_id.starts_with(STUDENT_NUMBER_PREFIX));
        assert_eq!(profile.current_semester, 1);
    }

    #[tokio::test]
    async fn test_simultaneous_registrations_get_distinct_numbers() {
        let repos = with_branch().await;
        let config = jwt_config();

        let (first, second) = tokio::join!(
            AuthService::register(&repos, &config, None, student("first@example.com")),
            AuthService::register(&repos, &config, None, student("second@example.com")),
        );
        let first = repos
            .students
            .find_by_user_id(first.unwrap().user.id)
            .await
            .unwrap()
            .unwrap();
        let second = repos
            .students
            .find_by_user_id(second.unwrap().user.id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.student_id, second.student_id);
    }

    #[tokio::test]
    async fn test_register_without_active_branch_fails() {
        let repos = Repositories::in_memory();
        let err = AuthService::register(&repos, &jwt_config(), None, student("a@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(repos.users.find_by_email("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repos = with_branch().await;
        let config = jwt_config();
        AuthService::register(&repos, &config, None, student("dup@example.com"))
            .await
            .unwrap();
        let err = AuthService::register(&repos, &config, None, student("DUP@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Email already registered");
    }

    #[tokio::test]
    async fn test_only_first_admin_can_self_register() {
        let repos = Repositories::in_memory();
        let config = jwt_config();
        let first = AuthService::register(&repos, &config, None, admin("root@example.com"))
            .await
            .unwrap();
        let stored = repos.users.find_by_id(first.user.id).await.unwrap().unwrap();
        assert!(stored.branch_id.is_none());

        let err = AuthService::register(&repos, &config, None, admin("second@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_rules() {
        let repos = with_branch().await;
        let config = jwt_config();
        let registered = AuthService::register(&repos, &config, None, student("l@example.com"))
            .await
            .unwrap();

        let wrong = AuthService::login(
            &repos,
            &config,
            LoginRequest {
                email: "l@example.com".to_string(),
                password: "nope-nope".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(wrong.message(), "Invalid credentials");

        let ok = AuthService::login(
            &repos,
            &config,
            LoginRequest {
                email: "l@example.com".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(ok.user.branch_id.is_some());

        repos
            .users
            .set_active(registered.user.id, false)
            .await
            .unwrap();
        let inactive = AuthService::login(
            &repos,
            &config,
            LoginRequest {
                email: "l@example.com".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(inactive.message(), "Account is inactive");
    }

    #[tokio::test]
    async fn test_refresh_and_change_password() {
        let repos = with_branch().await;
        let config = jwt_config();
        let registered = AuthService::register(&repos, &config, None, student("p@example.com"))
            .await
            .unwrap();

        let pair = AuthService::refresh(
            &repos,
            &config,
            RefreshTokenRequest {
                refresh_token: registered.refresh_token.clone(),
            },
        )
        .await
        .unwrap();
        assert!(verify_token(&pair.token, &config).is_ok());

        let user = repos.users.find_by_id(registered.user.id).await.unwrap().unwrap();
        let err = AuthService::change_password(
            &repos,
            &user,
            ChangePasswordDto {
                current_password: "wrong".to_string(),
                new_password: "another1".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Current password is incorrect");

        AuthService::change_password(
            &repos,
            &user,
            ChangePasswordDto {
                current_password: "secret1".to_string(),
                new_password: "another1".to_string(),
            },
        )
        .await
        .unwrap();
        let user = repos.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("another1", &user.password_hash).unwrap());
    }
}
