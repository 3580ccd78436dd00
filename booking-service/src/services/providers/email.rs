use super::{DeliveryReceipt, MailMessage, MailRelay, RelayError};
use crate::config::{SmtpConfig, SmtpCredentials};
use crate::models::DeliveryStage;
use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Mailbox,
    },
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        Error as SmtpError,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// SMTP replies that mean the relay refused our credentials.
const AUTH_REPLY_CODES: &[&str] = &["530", "534", "535", "538"];

/// Builds the wire message. Only the destination has to be a real address.
///
/// A submitter email that is not a mailbox is still written to Reply-To as a raw
/// header. A relay username that is not an address becomes the From display name,
/// with the destination as the address.
pub fn build_message(message: &MailMessage) -> Result<Message, RelayError> {
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e: AddressError| RelayError::Compose(format!("Invalid recipient: {}", e)))?;

    let from = match message.from.parse::<Mailbox>() {
        Ok(from) => from,
        Err(_) => Mailbox::new(Some(message.from.clone()), to.email.clone()),
    };

    let mut builder = Message::builder().from(from).to(to);

    if !message.reply_to.is_empty() {
        builder = match message.reply_to.parse::<Mailbox>() {
            Ok(reply_to) => builder.reply_to(reply_to),
            Err(_) => builder.raw_header(HeaderValue::new(
                HeaderName::new_from_ascii_str("Reply-To"),
                message.reply_to.clone(),
            )),
        };
    }

    builder
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| RelayError::Compose(e.to_string()))
}

/// Implicit-TLS (SMTPS) relay. Every delivery opens its own session and closes
/// it before returning; nothing is pooled between requests.
pub struct SmtpRelay {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpRelay {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout,
        }
    }

    fn transport(
        &self,
        credentials: &SmtpCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, RelayError> {
        let creds = Credentials::new(
            credentials.username.clone(),
            credentials.password.expose_secret().clone(),
        );

        // `relay` wraps the socket in TLS before the greeting, unlike `starttls_relay`.
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| RelayError::Connection(format!("Failed to create SMTP relay: {}", e)))?
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(creds)
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .build();

        Ok(transport)
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    async fn deliver(
        &self,
        credentials: &SmtpCredentials,
        message: &MailMessage,
    ) -> Result<DeliveryReceipt, RelayError> {
        let email = build_message(message)?;
        let transport = self.transport(credentials)?;

        tracing::debug!(
            stage = %DeliveryStage::Connecting,
            host = %self.host,
            port = self.port,
            "Opening SMTP session"
        );

        let response = tokio::time::timeout(self.timeout, transport.send(email))
            .await
            .map_err(|_| {
                RelayError::Connection(format!(
                    "SMTP session timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(classify_smtp_error)?;

        let relay_reply = response.message().next().map(|s| s.to_string());

        tracing::info!(
            stage = %DeliveryStage::Delivered,
            to = %message.to,
            code = %response.code(),
            "Email relayed successfully"
        );

        Ok(DeliveryReceipt { relay_reply })
    }
}

fn classify_smtp_error(err: SmtpError) -> RelayError {
    match err.status() {
        Some(code) if is_auth_reply(&code.to_string()) => {
            RelayError::Authentication(err.to_string())
        }
        Some(_) => RelayError::Rejected(err.to_string()),
        // lettre already leads with "Connection error", which the variant repeats.
        None => {
            let reason = err.to_string();
            let reason = reason
                .strip_prefix("Connection error: ")
                .unwrap_or(&reason)
                .to_string();
            RelayError::Connection(reason)
        }
    }
}

fn is_auth_reply(code: &str) -> bool {
    AUTH_REPLY_CODES.contains(&code)
}

/// A message accepted by [`MockMailRelay`], with its envelope and rendered form.
#[derive(Debug, Clone)]
pub struct DeliveredMail {
    pub message: MailMessage,
    pub envelope_from: Option<String>,
    pub envelope_to: Vec<String>,
    pub formatted: String,
}

/// In-process relay for tests. Composes exactly like [`SmtpRelay`], counts
/// connection attempts, and either records the message or fails as configured.
pub struct MockMailRelay {
    failure: Option<RelayError>,
    connection_attempts: AtomicU64,
    delivered: Mutex<Vec<DeliveredMail>>,
}

impl Default for MockMailRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailRelay {
    pub fn new() -> Self {
        Self {
            failure: None,
            connection_attempts: AtomicU64::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// A relay whose every session ends with `failure` after connecting.
    pub fn failing(failure: RelayError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new()
        }
    }

    pub fn connection_attempts(&self) -> u64 {
        self.connection_attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<DeliveredMail> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailRelay for MockMailRelay {
    async fn deliver(
        &self,
        _credentials: &SmtpCredentials,
        message: &MailMessage,
    ) -> Result<DeliveryReceipt, RelayError> {
        let email = build_message(message)?;

        self.connection_attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = &self.failure {
            tracing::info!(error = %failure, "[MOCK] Relay session failed");
            return Err(failure.clone());
        }

        let envelope = email.envelope();
        let delivered = DeliveredMail {
            message: message.clone(),
            envelope_from: envelope.from().map(|a| a.to_string()),
            envelope_to: envelope.to().iter().map(|a| a.to_string()).collect(),
            formatted: String::from_utf8_lossy(&email.formatted()).into_owned(),
        };

        self.delivered
            .lock()
            .map_err(|e| RelayError::Connection(format!("Mock relay mutex poisoned: {}", e)))?
            .push(delivered);

        tracing::info!(to = %message.to, "[MOCK] Email would be relayed");

        Ok(DeliveryReceipt {
            relay_reply: Some("2.0.0 OK mock".to_string()),
        })
    }
}
