use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Review-dependent booking state; kept in sync by
/// services::booking_status whenever the owning user's review for the
/// booked tour is created or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Planned,
    PendingReview,
    Reviewed,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tour: ObjectId,
    pub user: ObjectId,
    pub price: f64,
    pub paid: bool,
    pub status: BookingStatus,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Deserialize)]
pub struct BookingInput {
    pub tour: String,
    pub price: f64,
    pub paid: Option<bool>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusInput {
    pub status: BookingStatus,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Planned => "planned",
            BookingStatus::PendingReview => "pending-review",
            BookingStatus::Reviewed => "reviewed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::PendingReview).unwrap(),
            "\"pending-review\""
        );
        let s: BookingStatus = serde_json::from_str("\"reviewed\"").unwrap();
        assert_eq!(s, BookingStatus::Reviewed);
    }

    #[test]
    fn test_status_as_str_matches_serde() {
        for status in [
            BookingStatus::Planned,
            BookingStatus::PendingReview,
            BookingStatus::Reviewed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
