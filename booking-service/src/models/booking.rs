use serde::Deserialize;
use validator::Validate;

use crate::services::MailMessage;

/// Mailbox every booking request is relayed to.
pub const BOOKING_INBOX: &str = "hello@themaplin.com";

/// Booking form as submitted by the site. Only presence is checked; the
/// email is not validated beyond that.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Service is required"))]
    pub service: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

impl BookingRequest {
    /// Builds the relay message sent from `sender` to [`BOOKING_INBOX`].
    ///
    /// Values that end up in headers are sanitized; the body repeats the form verbatim.
    pub fn compose(&self, sender: &str) -> MailMessage {
        let name = sanitize_header_value(&self.name);
        let reply_to = sanitize_header_value(&self.email);

        let body = format!(
            "New Booking Request Details:\n\
             \n\
             Name: {}\n\
             Email: {}\n\
             Service: {}\n\
             \n\
             Message:\n\
             {}\n",
            self.name, self.email, self.service, self.message
        );

        MailMessage {
            from: sender.to_string(),
            to: BOOKING_INBOX.to_string(),
            reply_to,
            subject: format!("New Booking Request from {}", name),
            body,
        }
    }
}

/// Strips CR, LF and every other control character so submitter input cannot
/// start a new header line.
pub fn sanitize_header_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Progress of a single booking submission. Delivered and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    Received,
    Validated,
    Composing,
    Connecting,
    Authenticating,
    Sending,
    Delivered,
    Failed,
}

impl DeliveryStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStage::Delivered | DeliveryStage::Failed)
    }
}

impl std::fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStage::Received => write!(f, "received"),
            DeliveryStage::Validated => write!(f, "validated"),
            DeliveryStage::Composing => write!(f, "composing"),
            DeliveryStage::Connecting => write!(f, "connecting"),
            DeliveryStage::Authenticating => write!(f, "authenticating"),
            DeliveryStage::Sending => write!(f, "sending"),
            DeliveryStage::Delivered => write!(f, "delivered"),
            DeliveryStage::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> BookingRequest {
        BookingRequest {
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            service: "Consulting".to_string(),
            message: "Hi".to_string(),
        }
    }

    #[test]
    fn compose_addresses_fixed_inbox_from_relay_user() {
        let message = ada().compose("relay@themaplin.com");

        assert_eq!(message.from, "relay@themaplin.com");
        assert_eq!(message.to, BOOKING_INBOX);
        assert_eq!(message.reply_to, "ada@x.com");
        assert_eq!(message.subject, "New Booking Request from Ada");
    }

    #[test]
    fn compose_body_lists_every_field() {
        let message = ada().compose("relay@themaplin.com");

        assert_eq!(
            message.body,
            "New Booking Request Details:\n\nName: Ada\nEmail: ada@x.com\nService: Consulting\n\nMessage:\nHi\n"
        );
    }

    #[test]
    fn compose_strips_line_breaks_from_header_values() {
        let mut request = ada();
        request.name = "Ada\r\nBcc: victim@example.com".to_string();
        request.email = "ada@x.com\nBcc: victim@example.com".to_string();

        let message = request.compose("relay@themaplin.com");

        assert!(!message.subject.contains('\r'));
        assert!(!message.subject.contains('\n'));
        assert!(!message.reply_to.contains('\n'));
        assert_eq!(
            message.subject,
            "New Booking Request from AdaBcc: victim@example.com"
        );
    }

    #[test]
    fn compose_keeps_message_body_verbatim() {
        let mut request = ada();
        request.message = "Line one\r\nLine two".to_string();

        let message = request.compose("relay@themaplin.com");

        assert!(message.body.ends_with("Line one\r\nLine two\n"));
    }

    #[test]
    fn sanitize_removes_all_control_characters() {
        assert_eq!(sanitize_header_value("  a\tb\u{0}c\u{7f} "), "abc");
    }

    #[test]
    fn empty_fields_fail_validation() {
        let mut request = ada();
        request.service = String::new();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("service"));
    }

    #[test]
    fn terminal_stages() {
        assert!(DeliveryStage::Delivered.is_terminal());
        assert!(DeliveryStage::Failed.is_terminal());
        assert!(!DeliveryStage::Sending.is_terminal());
    }
}
