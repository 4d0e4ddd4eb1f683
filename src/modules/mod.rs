pub mod auth;
pub mod branches;
pub mod course_inquiries;
pub mod courses;
pub mod events;
pub mod faculty;
pub mod outstanding_students;
pub mod students;
pub mod testimonials;
pub mod uploads;
pub mod users;
