//! Generated profile numbers (`STU…`, `FAC…`, `ADM…`).
//!
//! A number is the prefix plus epoch milliseconds, so two accounts created in
//! the same millisecond collide on the unique column. [`with_profile_number`]
//! retries such an insert with the next millisecond.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use collegium_core::AppError;
use collegium_models::ids::profile_number;
use tracing::debug;

/// Inserts tried before a collision is reported.
pub const MAX_ATTEMPTS: i64 = 5;

/// A generated profile number is already stored. Surfaces as a 400 with the
/// wrapped message.
#[derive(Debug, Clone, Copy)]
pub struct ProfileNumberTaken(pub &'static str);

impl fmt::Display for ProfileNumberTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for ProfileNumberTaken {}

impl From<ProfileNumberTaken> for AppError {
    fn from(err: ProfileNumberTaken) -> Self {
        AppError::bad_request(err)
    }
}

impl ProfileNumberTaken {
    pub fn is_cause_of(err: &AppError) -> bool {
        err.error.downcast_ref::<Self>().is_some()
    }
}

/// Runs `insert` with a number generated now, moving one millisecond forward
/// after each collision.
pub async fn with_profile_number<T, F, Fut>(prefix: &str, insert: F) -> Result<T, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    with_profile_number_from(prefix, Utc::now(), insert).await
}

pub async fn with_profile_number_from<T, F, Fut>(
    prefix: &str,
    start: DateTime<Utc>,
    mut insert: F,
) -> Result<T, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0;
    loop {
        let number = profile_number(prefix, start + Duration::milliseconds(attempt));
        match insert(number).await {
            Err(err) if ProfileNumberTaken::is_cause_of(&err) && attempt + 1 < MAX_ATTEMPTS => {
                debug!(prefix, attempt, "profile number taken, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::repository::NewProfile;
    use crate::store::Repositories;
    use chrono::TimeZone;
    use collegium_models::UserRole;
    use collegium_models::ids::STUDENT_NUMBER_PREFIX;
    use collegium_models::students::NewStudent;
    use collegium_models::users::NewUser;
    use std::sync::Mutex;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Student".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Student,
            phone: None,
            address: None,
            branch_id: None,
        }
    }

    fn new_student(student_id: String) -> NewProfile {
        NewProfile::Student(NewStudent {
            student_id,
            roll_number: "1".to_string(),
            admission_year: 2026,
            guardian_name: None,
            guardian_contact: None,
            qualification: None,
            heard_about_us: None,
        })
    }

    async fn register_at(repos: &Repositories, email: &str, at: DateTime<Utc>) -> String {
        let users = &repos.users;
        let user = with_profile_number_from(STUDENT_NUMBER_PREFIX, at, move |number| {
            users.create_with_profile(new_user(email), new_student(number))
        })
        .await
        .unwrap();
        repos
            .students
            .find_by_user_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .student_id
    }

    #[tokio::test]
    async fn test_same_millisecond_registrations_both_succeed() {
        let repos = Repositories::in_memory();
        let at = Utc.timestamp_millis_opt(1_718_000_000_000).unwrap();

        let first = register_at(&repos, "one@example.com", at).await;
        let second = register_at(&repos, "two@example.com", at).await;

        assert_eq!(first, "STU1718000000000");
        assert_eq!(second, "STU1718000000001");
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_attempts() {
        let tried = Mutex::new(Vec::new());
        let at = Utc.timestamp_millis_opt(1_718_000_000_000).unwrap();

        let err = with_profile_number_from("ADM", at, |number| {
            tried.lock().unwrap().push(number);
            async { Err::<(), _>(ProfileNumberTaken("Admin id already exists").into()) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Admin id already exists");
        let tried = tried.into_inner().unwrap();
        assert_eq!(tried.len(), MAX_ATTEMPTS as usize);
        assert_eq!(tried.last().map(String::as_str), Some("ADM1718000000004"));
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mut calls = 0;
        let err = with_profile_number("FAC", |_| {
            calls += 1;
            async {
                Err::<(), _>(AppError::bad_request(anyhow::anyhow!(
                    "Email already registered"
                )))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.message(), "Email already registered");
        assert_eq!(calls, 1);
    }
}
