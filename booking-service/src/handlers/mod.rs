//! HTTP handlers for booking-service.

pub mod app;
pub mod booking;
pub mod health;
pub mod status;

pub use app::{not_found, root};
pub use booking::create_booking;
pub use health::{health_check, metrics, readiness_check};
pub use status::{create_status_check, list_status_checks};
