use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::{options::FindOptions, Client};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::middleware::role_auth::require_role;
use crate::models::booking::{Booking, BookingInput, BookingStatus, BookingStatusInput};
use crate::models::user::UserRole;
use crate::routes::{created_doc, success_doc, success_docs};
use crate::services::query::QueryFeatures;
use crate::services::tour_service::visible_filter;

/// Stripe Checkout handshake: the session's success URL carries the
/// tour/user/price triple; the frontend turns it into POST /bookings.
pub async fn checkout_session(
    claims: Claims,
    mongo_data: web::Data<Arc<Client>>,
    stripe_data: web::Data<Arc<stripe::Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = mongo_data.into_inner();
    let tour_id = path.into_inner();
    let tour_oid = ObjectId::parse_str(&tour_id)?;

    let tour = mongo::tours(&client)
        .find_one(visible_filter(doc! { "_id": tour_oid }))
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let success_url = format!(
        "{}/?tour={}&user={}&price={}",
        frontend_url, tour_id, claims.user_id, tour.price
    );
    let cancel_url = format!("{}/tour/{}", frontend_url, tour.slug);

    let mut params = stripe::CreateCheckoutSession::new();
    params.mode = Some(stripe::CheckoutSessionMode::Payment);
    params.success_url = Some(&success_url);
    params.cancel_url = Some(&cancel_url);
    params.customer_email = Some(&claims.sub);
    params.client_reference_id = Some(&tour_id);
    params.line_items = Some(vec![stripe::CreateCheckoutSessionLineItems {
        quantity: Some(1),
        price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
            currency: stripe::Currency::USD,
            unit_amount: Some((tour.price * 100.0) as i64),
            product_data: Some(
                stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: tour.name.clone(),
                    description: Some(tour.summary.clone()),
                    ..Default::default()
                },
            ),
            ..Default::default()
        }),
        ..Default::default()
    }]);

    match stripe::CheckoutSession::create(stripe_data.as_ref(), params).await {
        Ok(session) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "session": session,
        }))),
        Err(err) => {
            log::error!("Error creating checkout session: {:?}", err);
            Err(ApiError::Internal(format!(
                "Failed to create checkout session: {}",
                err
            )))
        }
    }
}

pub async fn create_booking(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    input: web::Json<BookingInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();
    let tour_id = ObjectId::parse_str(&input.tour)?;
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    mongo::tours(&client)
        .find_one(visible_filter(doc! { "_id": tour_id }))
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    let now = DateTime::now();
    let mut booking = Booking {
        id: None,
        tour: tour_id,
        user: user_id,
        price: input.price,
        paid: input.paid.unwrap_or(true),
        // A fresh booking is immediately reviewable
        status: input.status.unwrap_or(BookingStatus::PendingReview),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = mongo::bookings(&client).insert_one(&booking).await?;
    booking.id = result.inserted_id.as_object_id();

    Ok(created_doc(&booking))
}

pub async fn my_bookings(
    claims: Claims,
    data: web::Data<Arc<Client>>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    let cursor = mongo::bookings(&client).find(doc! { "user": user_id }).await?;
    let bookings: Vec<Booking> = cursor.try_collect().await?;

    Ok(success_docs(&bookings))
}

pub async fn get_booking(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let booking_id = ObjectId::parse_str(path.into_inner())?;

    let booking = mongo::bookings(&client)
        .find_one(doc! { "_id": booking_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No booking found with that ID".to_string()))?;

    authorize_owner(&booking.user, &claims)?;

    Ok(success_doc(&booking))
}

/// Status endpoint used by the review coordinator and the profile page.
pub async fn update_booking_status(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<BookingStatusInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let booking_id = ObjectId::parse_str(path.into_inner())?;
    let status = input.into_inner().status;
    let collection = mongo::bookings(&client);

    let booking = collection
        .find_one(doc! { "_id": booking_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No booking found with that ID".to_string()))?;

    authorize_owner(&booking.user, &claims)?;

    collection
        .update_one(
            doc! { "_id": booking_id },
            doc! { "$set": { "status": status.as_str(), "updated_at": DateTime::now() } },
        )
        .await?;

    let booking = collection
        .find_one(doc! { "_id": booking_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No booking found with that ID".to_string()))?;

    Ok(success_doc(&booking))
}

pub async fn get_all_bookings(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    require_role(&claims, &[UserRole::Admin, UserRole::LeadGuide])?;

    let client = data.into_inner();
    let features = QueryFeatures::from_params(&query);

    let options = FindOptions::builder()
        .sort(features.sort)
        .projection(features.projection)
        .skip(features.skip)
        .limit(features.limit)
        .build();

    let cursor = mongo::bookings(&client)
        .find(features.filter)
        .with_options(options)
        .await?;
    let bookings: Vec<Booking> = cursor.try_collect().await?;

    Ok(success_docs(&bookings))
}

fn authorize_owner(owner: &ObjectId, claims: &Claims) -> Result<(), ApiError> {
    if claims.role == UserRole::Admin || owner.to_hex() == claims.user_id {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "You can only access your own bookings".to_string(),
    ))
}
