mod common;

use axum::http::StatusCode;
use common::{image, setup_test_app, unique_email};
use serde_json::json;

#[tokio::test]
async fn test_testimonials_public_listing_and_toggle() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .post(
            "/api/testimonials",
            Some(&admin),
            json!({
                "name": "Priya Nair",
                "description": "The faculty made every lecture count.",
                "image": image("collegium/testimonials/p1"),
                "display_order": 2
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["rating"], 5);
    let second = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .post(
            "/api/testimonials",
            Some(&admin),
            json!({
                "name": "Arun Das",
                "description": "Great placement support and mentoring.",
                "image": image("collegium/testimonials/p2"),
                "rating": 4,
                "display_order": 1
            }),
        )
        .await;
    let first = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/testimonials", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["id"].as_str())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);

    let (status, body) = app
        .patch(
            &format!("/api/testimonials/{}/toggle-status", first),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = app.get("/api/testimonials?is_active=true", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_testimonial_rating_is_bounded() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .post(
            "/api/testimonials",
            Some(&admin),
            json!({
                "name": "Too Kind",
                "description": "Six stars out of five, honestly.",
                "image": image("collegium/testimonials/x"),
                "rating": 6
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_testimonial_delete_cleans_up_image() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let (_, body) = app
        .post(
            "/api/testimonials",
            Some(&admin),
            json!({
                "name": "Leaving Soon",
                "description": "Short lived testimonial for deletion.",
                "image": image("collegium/testimonials/gone")
            }),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap();

    let (status, _) = app
        .delete(&format!("/api/testimonials/{}", id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.storage.delete_attempts(),
        vec!["collegium/testimonials/gone".to_string()]
    );

    let (status, body) = app.get(&format!("/api/testimonials/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Testimonial not found");
}

#[tokio::test]
async fn test_outstanding_students_ranks_are_unique() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let record = |rank: i32, name: &str| {
        json!({
            "rank": rank,
            "name": name,
            "image": image(&format!("collegium/outstanding/{}", rank)),
            "college": "Collegium Institute",
            "company": "Acme",
            "role": "Engineer",
            "package": "12 LPA",
            "skills": "rust, sql"
        })
    };

    let (status, body) = app
        .post("/api/outstanding-students", Some(&admin), record(2, "Second Place"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["skills"], json!(["rust", "sql"]));

    let (status, _) = app
        .post("/api/outstanding-students", Some(&admin), record(1, "First Place"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/outstanding-students", Some(&admin), record(1, "Usurper"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A student with this rank already exists");

    let (status, body) = app.get("/api/outstanding-students", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, vec!["First Place", "Second Place"]);

    let id = body["data"][0]["id"].as_str().unwrap().to_string();
    app.storage.set_fail_deletes(true);
    let (status, _) = app
        .delete(&format!("/api/outstanding-students/{}", id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.storage.delete_attempts(),
        vec!["collegium/outstanding/1".to_string()]
    );
    assert_eq!(app.repos.pending_image_deletions.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_inquiry_lifecycle_and_stats() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let inquiry = |email: &str| {
        json!({
            "name": "Curious Student",
            "email": email,
            "phone": "+91 98765 43210",
            "qualification": "12th grade",
            "heard_about_us": "website",
            "message": "Interested in the data science course"
        })
    };

    let (status, body) = app
        .post("/api/course-inquiries", None, inquiry("Curious@Example.com"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Inquiry submitted successfully");
    assert_eq!(body["data"]["email"], "curious@example.com");
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    app.post("/api/course-inquiries", None, inquiry(&unique_email()))
        .await;

    let (status, body) = app
        .put(
            &format!("/api/course-inquiries/{}", id),
            Some(&admin),
            json!({ "status": "contacted", "notes": "Called on Monday" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "contacted");

    let (status, body) = app.get("/api/course-inquiries/stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["contacted"], 1);
    assert_eq!(body["data"]["enrolled"], 0);

    let (status, body) = app
        .get("/api/course-inquiries?status=pending", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_inquiry_listing_is_admin_only() {
    let app = setup_test_app().await;
    let (_, student) = app.user_token("student").await;

    let (status, _) = app.get("/api/course-inquiries", Some(&student)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/course-inquiries/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inquiry_rejects_bad_phone() {
    let app = setup_test_app().await;

    let (status, body) = app
        .post(
            "/api/course-inquiries",
            None,
            json!({
                "name": "Bad Phone",
                "email": unique_email(),
                "phone": "call me maybe",
                "qualification": "Graduate",
                "heard_about_us": "friend"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_faculty_crud_and_toggle() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .post(
            "/api/faculty",
            Some(&admin),
            json!({
                "name": "Dr. Meera Iyer",
                "email": "meera@example.com",
                "image": image("collegium/faculty/meera"),
                "specialization": "Distributed Systems",
                "qualification": "PhD",
                "expertise": "consensus, storage"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let faculty = &body["data"];
    assert!(faculty["employee_id"].as_str().unwrap().starts_with("FAC"));
    assert_eq!(faculty["expertise"], json!(["consensus", "storage"]));
    assert_eq!(faculty["experience"], 0);
    let id = faculty["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/api/faculty/{}/toggle-status", id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = app.get("/api/faculty/active", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    app.storage.set_fail_deletes(true);
    let (status, _) = app
        .delete(&format!("/api/faculty/{}", id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.repos.pending_image_deletions.count().await.unwrap(), 1);
}
