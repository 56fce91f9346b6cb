use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Client;
use std::sync::Arc;

use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::middleware::role_auth::require_role;
use crate::models::review::{Review, ReviewInput, ReviewUpdate};
use crate::models::user::UserRole;
use crate::routes::{created_doc, success_doc, success_docs};
use crate::services::booking_status::{sync_booking_status, ReviewEvent};
use crate::services::rating_service::recompute_tour_ratings;
use crate::services::tour_service::visible_filter;

pub async fn get_tour_reviews(
    _claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let tour_id = ObjectId::parse_str(path.into_inner())?;

    let cursor = mongo::reviews(&client).find(doc! { "tour": tour_id }).await?;
    let reviews: Vec<Review> = cursor.try_collect().await?;

    Ok(success_docs(&reviews))
}

pub async fn my_reviews(
    claims: Claims,
    data: web::Data<Arc<Client>>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    let cursor = mongo::reviews(&client).find(doc! { "user": user_id }).await?;
    let reviews: Vec<Review> = cursor.try_collect().await?;

    Ok(success_docs(&reviews))
}

pub async fn create_review(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<ReviewInput>,
) -> Result<HttpResponse, ApiError> {
    // Only travellers review tours; admins and guides do not
    require_role(&claims, &[UserRole::User])?;

    let client = data.into_inner();
    let tour_id = ObjectId::parse_str(path.into_inner())?;
    let user_id = ObjectId::parse_str(&claims.user_id)?;
    let input = input.into_inner();

    validate_rating(input.rating)?;

    mongo::tours(&client)
        .find_one(visible_filter(doc! { "_id": tour_id }))
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    let now = DateTime::now();
    let mut review = Review {
        id: None,
        review: input.review,
        rating: input.rating,
        tour: tour_id,
        user: user_id,
        created_at: Some(now),
        updated_at: Some(now),
    };

    // Unique (tour, user) index turns a second attempt into a 400
    let result = mongo::reviews(&client).insert_one(&review).await?;
    review.id = result.inserted_id.as_object_id();

    // Both follow-ups are best-effort; the review itself already exists
    if let Err(err) = recompute_tour_ratings(&client, tour_id).await {
        log::warn!("Rating recompute failed for tour {}: {}", tour_id, err);
    }
    if let Err(err) = sync_booking_status(&client, user_id, tour_id, ReviewEvent::Created).await {
        log::warn!("Booking status sync failed for tour {}: {}", tour_id, err);
    }

    Ok(created_doc(&review))
}

pub async fn update_review(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<ReviewUpdate>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let review_id = ObjectId::parse_str(path.into_inner())?;
    let update = input.into_inner();
    let collection = mongo::reviews(&client);

    // Snapshot before mutating so the tour id is still known afterwards
    let existing = collection
        .find_one(doc! { "_id": review_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No review found with that ID".to_string()))?;

    authorize_author(&existing.user, &claims)?;

    let mut set = Document::new();
    if let Some(review) = &update.review {
        set.insert("review", review);
    }
    if let Some(rating) = update.rating {
        validate_rating(rating)?;
        set.insert("rating", rating);
    }
    if set.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    set.insert("updated_at", DateTime::now());

    collection
        .update_one(doc! { "_id": review_id }, doc! { "$set": set })
        .await?;

    if let Err(err) = recompute_tour_ratings(&client, existing.tour).await {
        log::warn!("Rating recompute failed for tour {}: {}", existing.tour, err);
    }

    let review = collection
        .find_one(doc! { "_id": review_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No review found with that ID".to_string()))?;

    Ok(success_doc(&review))
}

pub async fn delete_review(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let review_id = ObjectId::parse_str(path.into_inner())?;
    let collection = mongo::reviews(&client);

    // Snapshot before mutating so the tour id is still known afterwards
    let existing = collection
        .find_one(doc! { "_id": review_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No review found with that ID".to_string()))?;

    authorize_author(&existing.user, &claims)?;

    collection.delete_one(doc! { "_id": review_id }).await?;

    if let Err(err) = recompute_tour_ratings(&client, existing.tour).await {
        log::warn!("Rating recompute failed for tour {}: {}", existing.tour, err);
    }
    if let Err(err) =
        sync_booking_status(&client, existing.user, existing.tour, ReviewEvent::Deleted).await
    {
        log::warn!(
            "Booking status sync failed for tour {}: {}",
            existing.tour,
            err
        );
    }

    Ok(HttpResponse::NoContent().finish())
}

fn validate_rating(rating: f64) -> Result<(), ApiError> {
    if !(1.0..=5.0).contains(&rating) {
        return Err(ApiError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

/// Only the review's author or an admin may modify it.
fn authorize_author(author: &ObjectId, claims: &Claims) -> Result<(), ApiError> {
    if claims.role == UserRole::Admin || author.to_hex() == claims.user_id {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "You can only modify your own reviews".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(user_id: &str, role: UserRole) -> Claims {
        Claims {
            sub: "user@example.com".to_string(),
            exp: 0,
            iat: 0,
            user_id: user_id.to_string(),
            role,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1.0).is_ok());
        assert!(validate_rating(5.0).is_ok());
        assert!(validate_rating(4.5).is_ok());
        assert!(validate_rating(0.5).is_err());
        assert!(validate_rating(5.5).is_err());
    }

    #[test]
    fn test_author_may_modify() {
        let author = ObjectId::new();
        let claims = claims_for(&author.to_hex(), UserRole::User);
        assert!(authorize_author(&author, &claims).is_ok());
    }

    #[test]
    fn test_admin_may_modify_any() {
        let author = ObjectId::new();
        let claims = claims_for(&ObjectId::new().to_hex(), UserRole::Admin);
        assert!(authorize_author(&author, &claims).is_ok());
    }

    #[test]
    fn test_other_users_are_forbidden() {
        let author = ObjectId::new();
        for role in [UserRole::User, UserRole::Guide, UserRole::LeadGuide] {
            let claims = claims_for(&ObjectId::new().to_hex(), role);
            let err = authorize_author(&author, &claims).unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));
        }
    }
}
