pub mod booking;
pub mod status_check;

pub use booking::{sanitize_header_value, BookingRequest, DeliveryStage, BOOKING_INBOX};
pub use status_check::{StatusCheck, StatusCheckCreate, STATUS_LIST_LIMIT};

use serde::{Deserialize, Serialize};

/// Plain acknowledgement body, `{"message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
