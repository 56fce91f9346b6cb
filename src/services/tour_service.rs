use mongodb::bson::{doc, Document};
use regex::Regex;

use crate::error::ApiError;

/// URL slug derived from the tour name. Recomputed on every create and
/// on any update that changes the name.
pub fn slugify(name: &str) -> String {
    let non_alnum = Regex::new(r"[^a-z0-9]+").unwrap();
    let lowered = name.to_lowercase();
    non_alnum
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Secret tours are invisible to every find-family query. The original
/// hid this in a query hook; here every read path applies it explicitly.
pub fn visible_filter(mut filter: Document) -> Document {
    filter.insert("secret_tour", doc! { "$ne": true });
    filter
}

pub fn validate_price_discount(price: f64, discount: Option<f64>) -> Result<(), ApiError> {
    if let Some(discount) = discount {
        if discount >= price {
            return Err(ApiError::BadRequest(format!(
                "Discount price ({}) should be below regular price",
                discount
            )));
        }
    }
    Ok(())
}
