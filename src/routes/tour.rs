use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime, Document};
use mongodb::{options::FindOptions, Client};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::middleware::role_auth::require_role;
use crate::models::tour::{Tour, TourInput, TourUpdate, DEFAULT_RATINGS_AVERAGE};
use crate::models::user::UserRole;
use crate::routes::{created_doc, success_doc, success_docs};
use crate::services::query::QueryFeatures;
use crate::services::tour_service::{slugify, validate_price_discount, visible_filter};

pub async fn get_all_tours(
    data: web::Data<Arc<Client>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let features = QueryFeatures::from_params(&query);

    let options = FindOptions::builder()
        .sort(features.sort)
        .projection(features.projection)
        .skip(features.skip)
        .limit(features.limit)
        .build();

    let cursor = mongo::tours(&client)
        .find(visible_filter(features.filter))
        .with_options(options)
        .await?;
    let tours: Vec<Tour> = cursor.try_collect().await?;

    Ok(success_docs(&tours))
}

pub async fn get_tour(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let tour_id = ObjectId::parse_str(path.into_inner())?;

    let tour = mongo::tours(&client)
        .find_one(visible_filter(doc! { "_id": tour_id }))
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    Ok(success_doc(&tour))
}

pub async fn create_tour(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    input: web::Json<TourInput>,
) -> Result<HttpResponse, ApiError> {
    require_role(&claims, &[UserRole::Admin, UserRole::LeadGuide])?;

    let client = data.into_inner();
    let input = input.into_inner();

    validate_price_discount(input.price, input.price_discount)?;

    let now = DateTime::now();
    let mut tour = Tour {
        id: None,
        slug: slugify(&input.name),
        name: input.name,
        duration: input.duration,
        max_group_size: input.max_group_size,
        difficulty: input.difficulty,
        ratings_average: DEFAULT_RATINGS_AVERAGE,
        ratings_quantity: 0,
        price: input.price,
        price_discount: input.price_discount,
        summary: input.summary,
        description: input.description,
        image_cover: input.image_cover,
        images: input.images,
        start_dates: input.start_dates,
        secret_tour: input.secret_tour,
        start_location: input.start_location,
        locations: input.locations,
        guides: input.guides,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = mongo::tours(&client).insert_one(&tour).await?;
    tour.id = result.inserted_id.as_object_id();

    Ok(created_doc(&tour))
}

pub async fn update_tour(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<TourUpdate>,
) -> Result<HttpResponse, ApiError> {
    require_role(&claims, &[UserRole::Admin, UserRole::LeadGuide])?;

    let client = data.into_inner();
    let tour_id = ObjectId::parse_str(path.into_inner())?;
    let update = input.into_inner();
    let collection = mongo::tours(&client);

    let existing = collection
        .find_one(doc! { "_id": tour_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    // Discount is validated against the price as it will be after the update
    let price = update.price.unwrap_or(existing.price);
    let discount = update.price_discount.or(existing.price_discount);
    validate_price_discount(price, discount)?;

    let set = build_update_doc(&update)?;
    if set.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    collection
        .update_one(doc! { "_id": tour_id }, doc! { "$set": set })
        .await?;

    let tour = collection
        .find_one(doc! { "_id": tour_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".to_string()))?;

    Ok(success_doc(&tour))
}

pub async fn delete_tour(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_role(&claims, &[UserRole::Admin, UserRole::LeadGuide])?;

    let client = data.into_inner();
    let tour_id = ObjectId::parse_str(path.into_inner())?;

    let result = mongo::tours(&client)
        .delete_one(doc! { "_id": tour_id })
        .await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("No tour found with that ID".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Rating/price statistics grouped by difficulty, over well-rated
/// visible tours.
pub async fn tour_stats(data: web::Data<Arc<Client>>) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();

    let pipeline = vec![
        doc! { "$match": visible_filter(doc! { "ratings_average": { "$gte": 4.5 } }) },
        doc! { "$group": {
            "_id": "$difficulty",
            "num_tours": { "$sum": 1 },
            "num_ratings": { "$sum": "$ratings_quantity" },
            "avg_rating": { "$avg": "$ratings_average" },
            "avg_price": { "$avg": "$price" },
            "min_price": { "$min": "$price" },
            "max_price": { "$max": "$price" },
        }},
        doc! { "$sort": { "avg_price": 1 } },
    ];

    let cursor = mongo::tours(&client).aggregate(pipeline).await?;
    let stats: Vec<Document> = cursor.try_collect().await?;

    Ok(success_docs(&stats))
}

fn build_update_doc(update: &TourUpdate) -> Result<Document, ApiError> {
    let mut set = Document::new();

    if let Some(name) = &update.name {
        set.insert("name", name);
        set.insert("slug", slugify(name));
    }
    if let Some(duration) = update.duration {
        set.insert("duration", duration);
    }
    if let Some(max_group_size) = update.max_group_size {
        set.insert("max_group_size", max_group_size);
    }
    if let Some(difficulty) = update.difficulty {
        set.insert("difficulty", bson(&difficulty)?);
    }
    if let Some(price) = update.price {
        set.insert("price", price);
    }
    if let Some(price_discount) = update.price_discount {
        set.insert("price_discount", price_discount);
    }
    if let Some(summary) = &update.summary {
        set.insert("summary", summary);
    }
    if let Some(description) = &update.description {
        set.insert("description", description);
    }
    if let Some(image_cover) = &update.image_cover {
        set.insert("image_cover", image_cover);
    }
    if let Some(images) = &update.images {
        set.insert("images", bson(images)?);
    }
    if let Some(start_dates) = &update.start_dates {
        set.insert("start_dates", bson(start_dates)?);
    }
    if let Some(secret_tour) = update.secret_tour {
        set.insert("secret_tour", secret_tour);
    }
    if let Some(start_location) = &update.start_location {
        set.insert("start_location", bson(start_location)?);
    }
    if let Some(locations) = &update.locations {
        set.insert("locations", bson(locations)?);
    }
    if let Some(guides) = &update.guides {
        set.insert("guides", bson(guides)?);
    }

    if !set.is_empty() {
        set.insert("updated_at", DateTime::now());
    }

    Ok(set)
}

fn bson<T: serde::Serialize>(value: &T) -> Result<mongodb::bson::Bson, ApiError> {
    to_bson(value).map_err(|e| ApiError::Internal(format!("BSON serialization failed: {}", e)))
}
