pub mod booking_status;
pub mod email_service;
pub mod query;
pub mod rating_service;
pub mod tour_service;
