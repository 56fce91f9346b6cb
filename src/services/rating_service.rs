use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime, Document},
    Client,
};

use crate::db::mongo;
use crate::error::ApiError;
use crate::models::tour::DEFAULT_RATINGS_AVERAGE;

/// Recomputes a tour's `ratings_quantity` / `ratings_average` from its
/// current review set. Called after every review create, update and
/// delete; callers treat a failure as a warning and keep the stale
/// aggregate until the next successful write.
pub async fn recompute_tour_ratings(client: &Client, tour_id: ObjectId) -> Result<(), ApiError> {
    let pipeline = vec![
        doc! { "$match": { "tour": tour_id } },
        doc! { "$group": {
            "_id": "$tour",
            "n_rating": { "$sum": 1 },
            "avg_rating": { "$avg": "$rating" },
        }},
    ];

    let mut cursor = mongo::reviews(client).aggregate(pipeline).await?;

    let update = match cursor.try_next().await? {
        Some(stats) => {
            let count = bson_to_i64(stats.get("n_rating"));
            let avg = bson_to_f64(stats.get("avg_rating")).unwrap_or(DEFAULT_RATINGS_AVERAGE);
            ratings_update(count, avg)
        }
        // Last review removed: back to defaults
        None => ratings_reset(),
    };

    mongo::tours(client)
        .update_one(doc! { "_id": tour_id }, update)
        .await?;

    Ok(())
}

/// Average is rounded to one decimal at write time, not in the pipeline.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn ratings_update(count: i64, avg: f64) -> Document {
    doc! { "$set": {
        "ratings_quantity": count,
        "ratings_average": round_to_tenth(avg),
        "updated_at": DateTime::now(),
    }}
}

pub fn ratings_reset() -> Document {
    doc! { "$set": {
        "ratings_quantity": 0i64,
        "ratings_average": DEFAULT_RATINGS_AVERAGE,
        "updated_at": DateTime::now(),
    }}
}

fn bson_to_i64(value: Option<&Bson>) -> i64 {
    match value {
        Some(Bson::Int32(n)) => *n as i64,
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

fn bson_to_f64(value: Option<&Bson>) -> Option<f64> {
    match value {
        Some(Bson::Double(n)) => Some(*n),
        Some(Bson::Int32(n)) => Some(*n as f64),
        Some(Bson::Int64(n)) => Some(*n as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(4.0), 4.0);
        assert_eq!(round_to_tenth(4.666666), 4.7);
        assert_eq!(round_to_tenth(3.8333333), 3.8);
        assert_eq!(round_to_tenth(4.25), 4.3);
    }

    #[test]
    fn test_mean_of_three_reviews_rounds_to_four() {
        // ratings 5, 4, 3 -> 4.0
        let avg = (5.0 + 4.0 + 3.0) / 3.0;
        let update = ratings_update(3, avg);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_i64("ratings_quantity").unwrap(), 3);
        assert_eq!(set.get_f64("ratings_average").unwrap(), 4.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let update = ratings_reset();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_i64("ratings_quantity").unwrap(), 0);
        assert_eq!(set.get_f64("ratings_average").unwrap(), 4.5);
    }

    #[test]
    fn test_bson_number_coercion() {
        assert_eq!(bson_to_i64(Some(&Bson::Int32(3))), 3);
        assert_eq!(bson_to_i64(Some(&Bson::Int64(7))), 7);
        assert_eq!(bson_to_i64(None), 0);
        assert_eq!(bson_to_f64(Some(&Bson::Double(4.5))), Some(4.5));
        assert_eq!(bson_to_f64(Some(&Bson::Int32(4))), Some(4.0));
        assert_eq!(bson_to_f64(None), None);
    }
}
