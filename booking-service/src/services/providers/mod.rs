pub mod email;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SmtpCredentials;
use crate::models::DeliveryStage;

pub use email::{build_message, DeliveredMail, MockMailRelay, SmtpRelay};

/// Why a relay attempt was abandoned. Each variant keeps the underlying text.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("Failed to build message: {0}")]
    Compose(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Relay rejected message: {0}")]
    Rejected(String),
}

impl RelayError {
    /// Stage the attempt was in when it failed.
    pub fn stage(&self) -> DeliveryStage {
        match self {
            RelayError::Compose(_) => DeliveryStage::Composing,
            RelayError::Connection(_) => DeliveryStage::Connecting,
            RelayError::Authentication(_) => DeliveryStage::Authenticating,
            RelayError::Rejected(_) => DeliveryStage::Sending,
        }
    }
}

/// Outbound message for a single relay session.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Final reply text from the relay, when it sent one.
    pub relay_reply: Option<String>,
}

/// Submits a message through an authenticated relay session opened for this call only.
#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn deliver(
        &self,
        credentials: &SmtpCredentials,
        message: &MailMessage,
    ) -> Result<DeliveryReceipt, RelayError>;
}
