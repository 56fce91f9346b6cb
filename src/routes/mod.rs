use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::middleware;

pub mod auth;
pub mod booking;
pub mod health;
pub mod review;
pub mod tour;

/// Full route table, shared by the server binary and the test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/users")
                        .route("/signup", web::post().to(auth::signup))
                        .route("/signin", web::post().to(auth::signin))
                        .route("/forgot-password", web::post().to(auth::forgot_password))
                        .route(
                            "/reset-password/{token}",
                            web::patch().to(auth::reset_password),
                        )
                        // Protected routes
                        .service(
                            web::scope("")
                                .wrap(middleware::auth::AuthMiddleware)
                                .route("/me", web::get().to(auth::user_session))
                                .route(
                                    "/update-password",
                                    web::patch().to(auth::update_password),
                                )
                                .route("/delete-me", web::delete().to(auth::delete_me)),
                        ),
                )
                .service(
                    web::scope("/tours")
                        .route("/stats", web::get().to(tour::tour_stats))
                        .service(
                            web::resource("")
                                .route(web::get().to(tour::get_all_tours))
                                .route(web::post().to(tour::create_tour)),
                        )
                        .service(
                            web::resource("/{tour_id}/reviews")
                                .route(web::get().to(review::get_tour_reviews))
                                .route(web::post().to(review::create_review)),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(tour::get_tour))
                                .route(web::patch().to(tour::update_tour))
                                .route(web::delete().to(tour::delete_tour)),
                        ),
                )
                .service(
                    web::scope("/reviews")
                        .wrap(middleware::auth::AuthMiddleware)
                        .route("/my-reviews", web::get().to(review::my_reviews))
                        .service(
                            web::resource("/{id}")
                                .route(web::patch().to(review::update_review))
                                .route(web::delete().to(review::delete_review)),
                        ),
                )
                .service(
                    web::scope("/bookings")
                        .wrap(middleware::auth::AuthMiddleware)
                        .route(
                            "/checkout-session/{tour_id}",
                            web::get().to(booking::checkout_session),
                        )
                        .route("/my-bookings", web::get().to(booking::my_bookings))
                        .route(
                            "/{id}/status",
                            web::patch().to(booking::update_booking_status),
                        )
                        .service(
                            web::resource("")
                                .route(web::get().to(booking::get_all_bookings))
                                .route(web::post().to(booking::create_booking)),
                        )
                        .route("/{id}", web::get().to(booking::get_booking)),
                ),
        );
}

// All success responses share the {status, data: {doc|docs}} envelope.

pub fn success_doc<T: Serialize>(doc: &T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "data": { "doc": doc },
    }))
}

pub fn created_doc<T: Serialize>(doc: &T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({
        "status": "success",
        "data": { "doc": doc },
    }))
}

pub fn success_docs<T: Serialize>(docs: &[T]) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "results": docs.len(),
        "data": { "docs": docs },
    }))
}
