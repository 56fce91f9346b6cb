mod common;

use actix_web::test;
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use serial_test::serial;

use common::TestApp;
use tours_api::models::user::UserRole;
use tours_api::routes::auth::generate_token;

fn tour_body() -> serde_json::Value {
    json!({
        "name": "The Test Tour",
        "duration": 5,
        "max_group_size": 10,
        "difficulty": "easy",
        "price": 400.0,
        "summary": "A tour for testing"
    })
}

fn token_for(role: UserRole) -> String {
    std::env::set_var("JWT_SECRET", "test-secret");
    generate_token("test@example.com", ObjectId::new(), role).expect("token generation")
}

#[actix_rt::test]
#[serial]
async fn test_protected_routes_require_token() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let protected = [
        "/api/v1/users/me",
        "/api/v1/reviews/my-reviews",
        "/api/v1/bookings/my-bookings",
        "/api/v1/bookings/checkout-session/507f1f77bcf86cd799439011",
    ];

    for uri in protected {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401, "expected 401 for {}", uri);
    }
}

#[actix_rt::test]
#[serial]
async fn test_invalid_token_is_rejected() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reviews/my-reviews")
        .insert_header(("Authorization", "Bearer not-a-real-token"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_unauthorized_errors_use_json_envelope() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    // Middleware-guarded scope
    let req = test::TestRequest::get().uri("/api/v1/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["message"],
        "You are not logged in! Please log in to get access."
    );

    // Extractor path on the mixed public/protected tours scope
    let req = test::TestRequest::post()
        .uri("/api/v1/tours")
        .insert_header(("Authorization", "Bearer not-a-real-token"))
        .set_json(&tour_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Invalid token");
}

#[actix_rt::test]
#[serial]
async fn test_tour_reviews_require_token() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/tours/507f1f77bcf86cd799439011/reviews")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_jwt_cookie_is_accepted() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    // Reaches the handler (which then rejects on role), so the cookie
    // passed authentication
    let token = token_for(UserRole::User);
    let req = test::TestRequest::post()
        .uri("/api/v1/tours")
        .cookie(actix_web::cookie::Cookie::new("jwt", token))
        .set_json(&tour_body())
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
#[serial]
async fn test_create_tour_requires_lead_guide_or_admin() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    for role in [UserRole::User, UserRole::Guide] {
        let req = test::TestRequest::post()
            .uri("/api/v1/tours")
            .insert_header(("Authorization", format!("Bearer {}", token_for(role))))
            .set_json(&tour_body())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }
}

#[actix_rt::test]
#[serial]
async fn test_create_tour_validates_discount_after_role_check() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    // Lead guide clears the role gate; the discount rule then rejects
    let req = test::TestRequest::post()
        .uri("/api/v1/tours")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(UserRole::LeadGuide)),
        ))
        .set_json(&json!({
            "name": "The Test Tour",
            "duration": 5,
            "max_group_size": 10,
            "difficulty": "easy",
            "price": 400.0,
            "price_discount": 500.0,
            "summary": "A tour for testing"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "fail");
}

#[actix_rt::test]
#[serial]
async fn test_review_creation_restricted_to_users() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    // Admins and guides do not review tours
    for role in [UserRole::Admin, UserRole::Guide, UserRole::LeadGuide] {
        let req = test::TestRequest::post()
            .uri("/api/v1/tours/507f1f77bcf86cd799439011/reviews")
            .insert_header(("Authorization", format!("Bearer {}", token_for(role))))
            .set_json(&json!({ "review": "Great trip", "rating": 5.0 }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }
}

#[actix_rt::test]
#[serial]
async fn test_review_rating_out_of_bounds() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tours/507f1f77bcf86cd799439011/reviews")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(UserRole::User)),
        ))
        .set_json(&json!({ "review": "Too good", "rating": 6.0 }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Rating must be between 1 and 5");
}

#[actix_rt::test]
#[serial]
async fn test_review_update_invalid_id() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::patch()
        .uri("/api/v1/reviews/not-an-id")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(UserRole::User)),
        ))
        .set_json(&json!({ "rating": 4.0 }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn test_booking_status_update_invalid_id() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::patch()
        .uri("/api/v1/bookings/not-an-id/status")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(UserRole::User)),
        ))
        .set_json(&json!({ "status": "reviewed" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn test_all_bookings_restricted() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(UserRole::User)),
        ))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}
