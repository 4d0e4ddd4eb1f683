//! Repository tests against a real database. Each test gets a fresh
//! database with the migrations applied (needs `DATABASE_URL`).

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use collegium::modules::branches::repository::SeatAdjustment;
use collegium::modules::events::repository::RegistrationOutcome;
use collegium::modules::students::repository::PromotionOutcome;
use collegium::modules::users::repository::NewProfile;
use collegium::store::Repositories;
use collegium::utils::profile_number::ProfileNumberTaken;
use collegium_models::branches::{Branch, NewBranch, SeatChange};
use collegium_models::events::{EventType, NewEvent};
use collegium_models::students::{NewStudent, Student};
use collegium_models::users::NewUser;
use collegium_models::{BranchId, EventId, ImageRef, StudentId, User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8]).to_uppercase()
}

async fn create_branch(repos: &Repositories, total: i32, available: i32) -> Branch {
    repos
        .branches
        .create(NewBranch {
            branch_name: "Mechanical".to_string(),
            branch_code: unique("ME"),
            description: String::new(),
            address: None,
            city: None,
            state: None,
            pincode: None,
            contact_phone: None,
            contact_email: None,
            facilities: vec![],
            is_headquarters: false,
            department_head: None,
            total_seats: total,
            available_seats: available,
            established_year: None,
            images: vec![],
        })
        .await
        .unwrap()
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Priya Nair".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role: UserRole::Student,
        phone: None,
        address: None,
        branch_id: None,
    }
}

fn new_student(student_id: &str) -> NewProfile {
    NewProfile::Student(NewStudent {
        student_id: student_id.to_string(),
        roll_number: "20261".to_string(),
        admission_year: 2026,
        guardian_name: None,
        guardian_contact: None,
        qualification: None,
        heard_about_us: None,
    })
}

async fn create_student(repos: &Repositories) -> (User, Student) {
    let email = format!("{}@example.com", unique("s").to_lowercase());
    let user = repos
        .users
        .create_with_profile(new_user(&email), new_student(&unique("STU")))
        .await
        .unwrap();
    let student = repos.students.find_by_user_id(user.id).await.unwrap().unwrap();
    (user, student)
}

async fn create_event(
    repos: &Repositories,
    max_participants: Option<i32>,
    ended: bool,
) -> EventId {
    let start = if ended {
        Utc::now() - Duration::days(3)
    } else {
        Utc::now() + Duration::days(3)
    };
    repos
        .events
        .create(NewEvent {
            event_name: "Robotics Meetup".to_string(),
            description: "Hands-on session".to_string(),
            event_type: EventType::Technical,
            category: None,
            start_date: start,
            end_date: start + Duration::hours(4),
            venue: "Hall A".to_string(),
            organizer: "Robotics Club".to_string(),
            image: ImageRef {
                url: "https://cdn.example.com/events/robotics.png".to_string(),
                public_id: "events/robotics".to_string(),
            },
            registration_link: None,
            max_participants,
            is_featured: false,
            created_by: None,
        })
        .await
        .unwrap()
        .id
}

#[sqlx::test(migrations = "./migrations")]
async fn test_adjust_seats_guarded_update(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let branch = create_branch(&repos, 10, 3).await;

    let outcome = repos.branches.adjust_seats(branch.id, -5).await.unwrap();
    assert!(matches!(outcome, SeatAdjustment::Insufficient));
    let outcome = repos.branches.adjust_seats(branch.id, 8).await.unwrap();
    assert!(matches!(outcome, SeatAdjustment::OverCapacity));

    // would overflow a 32-bit sum
    let outcome = repos.branches.adjust_seats(branch.id, i32::MAX).await.unwrap();
    assert!(matches!(outcome, SeatAdjustment::OverCapacity));
    let outcome = repos.branches.adjust_seats(branch.id, i32::MIN).await.unwrap();
    assert!(matches!(outcome, SeatAdjustment::Insufficient));

    match repos.branches.adjust_seats(branch.id, -3).await.unwrap() {
        SeatAdjustment::Updated(updated) => assert_eq!(updated.available_seats, 0),
        other => panic!("expected an update, got {:?}", other),
    }

    let outcome = repos.branches.adjust_seats(BranchId::new(), 1).await.unwrap();
    assert!(matches!(outcome, SeatAdjustment::NotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_branch_update_resolves_seats_against_stored_row(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let branch = create_branch(&repos, 10, 10).await;

    let mut stale = branch.clone();
    repos.branches.adjust_seats(branch.id, -6).await.unwrap();

    stale.branch_name = "Mechatronics".to_string();
    let updated = repos
        .branches
        .update(&stale, SeatChange::default())
        .await
        .unwrap();
    assert_eq!(updated.branch_name, "Mechatronics");
    assert_eq!((updated.total_seats, updated.available_seats), (10, 4));

    let grown = SeatChange {
        total_seats: Some(20),
        available_seats: None,
    };
    let updated = repos.branches.update(&stale, grown).await.unwrap();
    assert_eq!((updated.total_seats, updated.available_seats), (20, 14));

    let shrunk = SeatChange {
        total_seats: Some(5),
        available_seats: None,
    };
    let err = repos.branches.update(&stale, shrunk).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), "Total seats cannot be less than occupied seats");

    let overfilled = SeatChange {
        total_seats: None,
        available_seats: Some(21),
    };
    let err = repos.branches.update(&stale, overfilled).await.unwrap_err();
    assert_eq!(err.message(), "Available seats cannot exceed total seats");

    let stored = repos.branches.find_by_id(branch.id).await.unwrap().unwrap();
    assert_eq!((stored.total_seats, stored.available_seats), (20, 14));

    let mut gone = stale.clone();
    gone.id = BranchId::new();
    let err = repos
        .branches
        .update(&gone, SeatChange::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_branch_code_is_bad_request(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let first = create_branch(&repos, 10, 10).await;
    let second = create_branch(&repos, 10, 10).await;

    let mut renamed = second.clone();
    renamed.branch_code = first.branch_code.clone();
    let err = repos
        .branches
        .update(&renamed, SeatChange::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), "Branch code already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_event_registration_transaction(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let (first, _) = create_student(&repos).await;
    let (second, _) = create_student(&repos).await;
    let event = create_event(&repos, Some(1), false).await;

    match repos.events.register(event, first.id).await.unwrap() {
        RegistrationOutcome::Registered(e) => assert_eq!(e.participant_count, 1),
        other => panic!("expected a registration, got {:?}", other),
    }
    let outcome = repos.events.register(event, first.id).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::AlreadyRegistered));

    // the inserted registration row is rolled back with the refused increment
    let outcome = repos.events.register(event, second.id).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::Full));
    assert!(!repos.events.is_registered(event, second.id).await.unwrap());
    let stored = repos.events.find_by_id(event).await.unwrap().unwrap();
    assert_eq!(stored.participant_count, 1);
    assert_eq!(repos.events.participants(event).await.unwrap(), vec![first.id]);

    let ended = create_event(&repos, None, true).await;
    let outcome = repos.events.register(ended, second.id).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::Ended));
    assert!(!repos.events.is_registered(ended, second.id).await.unwrap());

    let outcome = repos.events.register(EventId::new(), second.id).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::NotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_promote_stops_at_final_semester(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let (_, student) = create_student(&repos).await;

    let student = repos.students.update(&student, Some(7)).await.unwrap();
    match repos.students.promote(student.id).await.unwrap() {
        PromotionOutcome::Promoted(s) => assert_eq!(s.current_semester, 8),
        other => panic!("expected a promotion, got {:?}", other),
    }
    let outcome = repos.students.promote(student.id).await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::FinalSemester));

    // an edit without a semester leaves the promoted value alone
    let edited = repos.students.update(&student, None).await.unwrap();
    assert_eq!(edited.current_semester, 8);

    let outcome = repos.students.promote(StudentId::new()).await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::NotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_set_gpa_derives_outstanding_flag(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let (_, student) = create_student(&repos).await;

    let updated = repos.students.set_gpa(student.id, 8.5).await.unwrap().unwrap();
    assert_eq!(updated.gpa, 8.5);
    assert!(updated.is_outstanding);

    let updated = repos.students.set_gpa(student.id, 8.49).await.unwrap().unwrap();
    assert!(!updated.is_outstanding);

    assert!(repos.students.set_gpa(StudentId::new(), 9.0).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_with_profile_rolls_back_user_on_profile_conflict(pool: PgPool) {
    let repos = Repositories::postgres(pool);
    let (first, student) = create_student(&repos).await;

    let err = repos
        .users
        .create_with_profile(
            new_user("late@example.com"),
            new_student(&student.student_id),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), "Student id already exists");
    assert!(ProfileNumberTaken::is_cause_of(&err));
    assert!(repos.users.find_by_email("late@example.com").await.unwrap().is_none());

    let err = repos
        .users
        .create_with_profile(
            new_user(&first.email.to_uppercase()),
            new_student(&unique("STU")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), "Email already registered");
    assert!(!ProfileNumberTaken::is_cause_of(&err));
}
