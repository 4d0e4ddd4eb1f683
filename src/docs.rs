use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use collegium_auth::TokenPair;
use collegium_core::{MessageResponse, PaginationMeta, PaginationParams};
use collegium_models::admins::Admin;
use collegium_models::auth::{
    AuthResponse, AuthUserInfo, LoginRequest, ProfilePayload, RefreshTokenRequest,
    RegisterRequest,
};
use collegium_models::branches::{
    AssignDepartmentHeadDto, Branch, BranchDetails, BranchStatistics, BranchSummary,
    CreateBranchDto, UpdateBranchDto, UpdateSeatsDto,
};
use collegium_models::courses::{
    AssignFacultyDto, Course, CourseDetails, CourseSummary, CreateCourseDto, PrerequisiteDto,
    UpdateCourseDto,
};
use collegium_models::events::{
    CreateEventDto, Event, EventDetails, EventType, RegistrationStatus, UpdateEventDto,
};
use collegium_models::faculty::{CreateFacultyDto, Faculty, FacultyDetails, UpdateFacultyDto};
use collegium_models::images::{AddGalleryImageDto, AddImagesDto, BranchImage, GalleryImage, ImageRef};
use collegium_models::inquiries::{
    CourseInquiry, CreateInquiryDto, InquirySource, InquiryStats, InquiryStatus,
    UpdateInquiryDto,
};
use collegium_models::outstanding_students::{
    CreateOutstandingStudentDto, OutstandingStudent, UpdateOutstandingStudentDto,
};
use collegium_models::profile::UserProfile;
use collegium_models::students::{
    Achievement, AchievementCategory, AddAchievementDto, EnrollCourseDto, Student,
    StudentDetails, UpdateAttendanceDto, UpdateGpaDto, UpdateStudentDto,
};
use collegium_models::testimonials::{
    CreateTestimonialDto, Testimonial, UpdateTestimonialDto,
};
use collegium_models::users::{
    ChangePasswordDto, UpdateProfileDto, User, UserRole, UserStatusDto, UserSummary,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::update_profile,
        crate::modules::auth::controller::change_password,
        crate::modules::users::controller::set_user_status,
        crate::modules::users::controller::get_user_profile,
        crate::modules::branches::controller::create_branch,
        crate::modules::branches::controller::get_branches,
        crate::modules::branches::controller::get_active_branches,
        crate::modules::branches::controller::get_branch,
        crate::modules::branches::controller::get_branch_statistics,
        crate::modules::branches::controller::update_branch,
        crate::modules::branches::controller::delete_branch,
        crate::modules::branches::controller::assign_department_head,
        crate::modules::branches::controller::update_seats,
        crate::modules::branches::controller::add_branch_images,
        crate::modules::branches::controller::remove_branch_image,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_active_courses,
        crate::modules::courses::controller::get_courses_by_branch,
        crate::modules::courses::controller::get_courses_by_semester,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::assign_faculty,
        crate::modules::courses::controller::add_prerequisite,
        crate::modules::courses::controller::remove_prerequisite,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_outstanding_students,
        crate::modules::students::controller::get_top_performers,
        crate::modules::students::controller::get_students_by_semester,
        crate::modules::students::controller::get_student_by_user_id,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::update_gpa,
        crate::modules::students::controller::update_attendance,
        crate::modules::students::controller::promote_student,
        crate::modules::students::controller::add_achievement,
        crate::modules::students::controller::enroll_course,
        crate::modules::students::controller::unenroll_course,
        crate::modules::faculty::controller::create_faculty,
        crate::modules::faculty::controller::get_faculty_list,
        crate::modules::faculty::controller::get_active_faculty,
        crate::modules::faculty::controller::get_faculty,
        crate::modules::faculty::controller::update_faculty,
        crate::modules::faculty::controller::delete_faculty,
        crate::modules::faculty::controller::toggle_faculty_status,
        crate::modules::events::controller::create_event,
        crate::modules::events::controller::get_events,
        crate::modules::events::controller::get_upcoming_events,
        crate::modules::events::controller::get_past_events,
        crate::modules::events::controller::get_featured_events,
        crate::modules::events::controller::get_events_by_type,
        crate::modules::events::controller::get_event,
        crate::modules::events::controller::update_event,
        crate::modules::events::controller::delete_event,
        crate::modules::events::controller::register_for_event,
        crate::modules::events::controller::unregister_from_event,
        crate::modules::events::controller::get_registration_status,
        crate::modules::events::controller::add_event_image,
        crate::modules::events::controller::remove_event_image,
        crate::modules::outstanding_students::controller::create_outstanding_student,
        crate::modules::outstanding_students::controller::get_outstanding_students,
        crate::modules::outstanding_students::controller::get_outstanding_student,
        crate::modules::outstanding_students::controller::update_outstanding_student,
        crate::modules::outstanding_students::controller::delete_outstanding_student,
        crate::modules::outstanding_students::controller::toggle_outstanding_student_status,
        crate::modules::testimonials::controller::create_testimonial,
        crate::modules::testimonials::controller::get_testimonials,
        crate::modules::testimonials::controller::get_testimonial,
        crate::modules::testimonials::controller::update_testimonial,
        crate::modules::testimonials::controller::delete_testimonial,
        crate::modules::testimonials::controller::toggle_testimonial_status,
        crate::modules::course_inquiries::controller::create_inquiry,
        crate::modules::course_inquiries::controller::get_inquiries,
        crate::modules::course_inquiries::controller::get_inquiry_stats,
        crate::modules::course_inquiries::controller::get_inquiry,
        crate::modules::course_inquiries::controller::update_inquiry,
        crate::modules::course_inquiries::controller::delete_inquiry,
        crate::modules::uploads::controller::upload_image,
    ),
    components(
        schemas(
            User,
            UserRole,
            UserSummary,
            UserProfile,
            UserStatusDto,
            UpdateProfileDto,
            ChangePasswordDto,
            Admin,
            RegisterRequest,
            ProfilePayload,
            LoginRequest,
            RefreshTokenRequest,
            AuthUserInfo,
            AuthResponse,
            TokenPair,
            Branch,
            BranchSummary,
            BranchDetails,
            BranchStatistics,
            BranchImage,
            CreateBranchDto,
            UpdateBranchDto,
            AssignDepartmentHeadDto,
            UpdateSeatsDto,
            Course,
            CourseSummary,
            CourseDetails,
            CreateCourseDto,
            UpdateCourseDto,
            AssignFacultyDto,
            PrerequisiteDto,
            Student,
            StudentDetails,
            Achievement,
            AchievementCategory,
            UpdateStudentDto,
            UpdateGpaDto,
            UpdateAttendanceDto,
            AddAchievementDto,
            EnrollCourseDto,
            Faculty,
            FacultyDetails,
            CreateFacultyDto,
            UpdateFacultyDto,
            Event,
            EventType,
            EventDetails,
            RegistrationStatus,
            CreateEventDto,
            UpdateEventDto,
            GalleryImage,
            AddGalleryImageDto,
            AddImagesDto,
            ImageRef,
            OutstandingStudent,
            CreateOutstandingStudentDto,
            UpdateOutstandingStudentDto,
            Testimonial,
            CreateTestimonialDto,
            UpdateTestimonialDto,
            CourseInquiry,
            CreateInquiryDto,
            UpdateInquiryDto,
            InquiryStatus,
            InquirySource,
            InquiryStats,
            MessageResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and the caller's own account"),
        (name = "Users", description = "Account administration"),
        (name = "Branches", description = "Branches, seats and branch images"),
        (name = "Courses", description = "Course catalogue and prerequisites"),
        (name = "Students", description = "Student records, grades and promotion"),
        (name = "Faculty", description = "Faculty directory"),
        (name = "Events", description = "Events, registrations and galleries"),
        (name = "Outstanding Students", description = "Ranked showcase of top students"),
        (name = "Testimonials", description = "Public testimonials"),
        (name = "Course Inquiries", description = "Prospective student inquiries"),
        (name = "Uploads", description = "Image uploads")
    ),
    info(
        title = "Collegium API",
        version = "0.1.0",
        description = "REST API for running an educational institution, built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/branches/{id}/seats",
            "/api/events/{id}/register",
            "/api/course-inquiries/stats",
            "/api/uploads/{folder}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
