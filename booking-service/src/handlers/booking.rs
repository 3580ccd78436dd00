use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::models::{BookingRequest, DeliveryStage, MessageResponse};
use crate::services::record_booking;
use crate::startup::AppState;

pub const BOOKING_ACCEPTED: &str = "Booking request sent successfully";

/// Relays a booking form to the fixed inbox in a single, synchronous attempt.
///
/// Missing relay credentials fail closed before any connection is made.
/// Any later failure is returned as an email error carrying the relay's reason.
#[tracing::instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(booking) = payload?;
    tracing::debug!(stage = %DeliveryStage::Received, "Booking request received");

    booking.validate()?;
    tracing::debug!(stage = %DeliveryStage::Validated, "Booking request validated");

    let Some(credentials) = state.config.smtp.credentials() else {
        tracing::error!(
            stage = %DeliveryStage::Failed,
            "SMTP credentials not configured; refusing to contact relay"
        );
        record_booking("misconfigured");
        return Err(AppError::Misconfigured(
            "SMTP credentials not configured".to_string(),
        ));
    };

    tracing::debug!(
        stage = %DeliveryStage::Composing,
        service = %booking.service,
        "Composing booking email"
    );
    let message = booking.compose(&credentials.username);

    match state.mail_relay.deliver(&credentials, &message).await {
        Ok(receipt) => {
            tracing::info!(
                stage = %DeliveryStage::Delivered,
                relay_reply = receipt.relay_reply.as_deref().unwrap_or("-"),
                "Booking request relayed"
            );
            record_booking("delivered");
            Ok(Json(MessageResponse::new(BOOKING_ACCEPTED)))
        }
        Err(e) => {
            tracing::error!(
                stage = %DeliveryStage::Failed,
                failed_during = %e.stage(),
                error = %e,
                "Error sending email"
            );
            record_booking("failed");
            Err(AppError::EmailError(format!("Error sending email: {}", e)))
        }
    }
}
