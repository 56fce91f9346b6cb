use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Client,
};

use crate::db::mongo;
use crate::error::ApiError;
use crate::models::booking::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    Created,
    Deleted,
}

/// Transition table for the review-dependent part of the booking life
/// cycle. `None` means the event does not move this booking.
pub fn next_status(current: BookingStatus, event: ReviewEvent) -> Option<BookingStatus> {
    match (current, event) {
        (BookingStatus::PendingReview, ReviewEvent::Created) => Some(BookingStatus::Reviewed),
        (BookingStatus::Reviewed, ReviewEvent::Deleted) => Some(BookingStatus::PendingReview),
        _ => None,
    }
}

/// Single authoritative sync point between reviews and booking status,
/// called after a review is created or deleted. Best-effort: callers
/// log a warning on failure and the review operation still succeeds.
/// No booking for the tour is a no-op, since reviews are not gated on
/// booking existence.
pub async fn sync_booking_status(
    client: &Client,
    user: ObjectId,
    tour: ObjectId,
    event: ReviewEvent,
) -> Result<(), ApiError> {
    let collection = mongo::bookings(client);

    let booking = collection
        .find_one(doc! { "user": user, "tour": tour })
        .await?;

    let booking = match booking {
        Some(booking) => booking,
        None => return Ok(()),
    };

    if let Some(status) = next_status(booking.status, event) {
        collection
            .update_one(
                doc! { "_id": booking.id },
                doc! { "$set": {
                    "status": status.as_str(),
                    "updated_at": DateTime::now(),
                }},
            )
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus::*;

    #[test]
    fn test_review_created_moves_pending_to_reviewed() {
        assert_eq!(next_status(PendingReview, ReviewEvent::Created), Some(Reviewed));
    }

    #[test]
    fn test_review_deleted_moves_reviewed_back() {
        assert_eq!(
            next_status(Reviewed, ReviewEvent::Deleted),
            Some(PendingReview)
        );
    }

    #[test]
    fn test_all_other_combinations_are_noops() {
        assert_eq!(next_status(Planned, ReviewEvent::Created), None);
        assert_eq!(next_status(Planned, ReviewEvent::Deleted), None);
        assert_eq!(next_status(Reviewed, ReviewEvent::Created), None);
        assert_eq!(next_status(PendingReview, ReviewEvent::Deleted), None);
    }
}
