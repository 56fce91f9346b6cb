use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub review: String,
    pub rating: f64,
    pub tour: ObjectId,
    pub user: ObjectId,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub review: String,
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUpdate {
    pub review: Option<String>,
    pub rating: Option<f64>,
}
