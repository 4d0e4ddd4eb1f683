//! In-process store used by tests.
//!
//! One mutex guards every table, so each repository call observes and
//! mutates a consistent snapshot the way a single SQL statement or
//! transaction does against Postgres.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use collegium_models::admins::Admin;
use collegium_models::branches::Branch;
use collegium_models::courses::Course;
use collegium_models::events::Event;
use collegium_models::faculty::Faculty;
use collegium_models::inquiries::CourseInquiry;
use collegium_models::outstanding_students::OutstandingStudent;
use collegium_models::students::Student;
use collegium_models::testimonials::Testimonial;
use collegium_models::{EventId, PendingImageDeletion, User, UserId};

#[derive(Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub students: Vec<Student>,
    pub admins: Vec<Admin>,
    pub faculty: Vec<Faculty>,
    pub branches: Vec<Branch>,
    pub courses: Vec<Course>,
    pub events: Vec<Event>,
    pub registrations: Vec<Registration>,
    pub outstanding_students: Vec<OutstandingStudent>,
    pub testimonials: Vec<Testimonial>,
    pub inquiries: Vec<CourseInquiry>,
    pub pending_image_deletions: Vec<PendingImageDeletion>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub event_id: EventId,
    pub user_id: UserId,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Case-insensitive substring match over any of `fields`.
pub fn matches_search(search: Option<&str>, fields: &[&str]) -> bool {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            fields.iter().any(|f| f.to_lowercase().contains(&term))
        }
    }
}

/// Clones matching rows newest first. Rows inserted later win timestamp ties.
pub fn newest_first<T: Clone>(
    rows: &[T],
    created_at: impl Fn(&T) -> DateTime<Utc>,
    keep: impl Fn(&T) -> bool,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().filter(|r| keep(r)).cloned().collect();
    out.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    out
}
