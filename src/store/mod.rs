//! Repository wiring.
//!
//! Every module declares its repository trait next to its service and
//! implements it for both backends here: [`PgStore`] for production and,
//! with the `test-utils` feature, [`MemoryStore`] for service and HTTP tests.

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use sqlx::PgPool;

use crate::modules::branches::repository::BranchRepository;
use crate::modules::course_inquiries::repository::InquiryRepository;
use crate::modules::courses::repository::CourseRepository;
use crate::modules::events::repository::EventRepository;
use crate::modules::faculty::repository::FacultyRepository;
use crate::modules::outstanding_students::repository::OutstandingStudentRepository;
use crate::modules::students::repository::StudentRepository;
use crate::modules::testimonials::repository::TestimonialRepository;
use crate::modules::uploads::repository::PendingImageDeletionRepository;
use crate::modules::users::repository::UserRepository;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub faculty: Arc<dyn FacultyRepository>,
    pub branches: Arc<dyn BranchRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub events: Arc<dyn EventRepository>,
    pub outstanding_students: Arc<dyn OutstandingStudentRepository>,
    pub testimonials: Arc<dyn TestimonialRepository>,
    pub inquiries: Arc<dyn InquiryRepository>,
    pub pending_image_deletions: Arc<dyn PendingImageDeletionRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(PgStore::new(pool))
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    /// Wires every repository to `store`; keep a clone to seed rows directly.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_memory(store: MemoryStore) -> Self {
        Self::from_store(store)
    }

    fn from_store<S>(store: S) -> Self
    where
        S: UserRepository
            + StudentRepository
            + FacultyRepository
            + BranchRepository
            + CourseRepository
            + EventRepository
            + OutstandingStudentRepository
            + TestimonialRepository
            + InquiryRepository
            + PendingImageDeletionRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            students: store.clone(),
            faculty: store.clone(),
            branches: store.clone(),
            courses: store.clone(),
            events: store.clone(),
            outstanding_students: store.clone(),
            testimonials: store.clone(),
            inquiries: store.clone(),
            pending_image_deletions: store,
        }
    }
}
