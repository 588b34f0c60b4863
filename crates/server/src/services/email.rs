//! Outbound email for confirmation and password reset links.
//!
//! [`EmailGateway`] is the seam the account service sends through. Bodies
//! carry single-use tokens, so they are never logged.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use barberbook_core::Email;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum TransportError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// No mail transport is configured.
    #[error("email delivery is not configured")]
    NotConfigured,

    /// Delivery failed for a reason outside the transport library.
    #[error("email delivery unavailable: {0}")]
    Unavailable(String),
}

/// Delivers a plain-text message to one recipient.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    /// Send `body` to `to` with `subject`.
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// SMTP delivery via STARTTLS relay.
#[derive(Clone)]
pub struct SmtpEmailGateway {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailGateway {
    /// Create a new gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl EmailGateway for SmtpEmailGateway {
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), TransportError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| TransportError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| TransportError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Gateway used when SMTP is not configured. Every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEmailGateway;

#[async_trait]
impl EmailGateway for DisabledEmailGateway {
    async fn send(&self, to: &Email, subject: &str, _body: &str) -> Result<(), TransportError> {
        tracing::warn!(to = %to, subject = %subject, "Email not sent: SMTP is not configured");
        Err(TransportError::NotConfigured)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{RecordingEmailGateway, SentEmail};

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use barberbook_core::Email;

    use super::{EmailGateway, TransportError};

    /// A message captured by [`RecordingEmailGateway`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentEmail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    impl SentEmail {
        /// Value of the `token` query parameter in the first link of the body.
        #[must_use]
        pub fn token(&self) -> Option<&str> {
            let (_, rest) = self.body.split_once("?token=")?;
            rest.split_whitespace().next()
        }
    }

    /// Captures sent messages in memory; can be switched to fail every send.
    #[derive(Debug, Default)]
    pub struct RecordingEmailGateway {
        sent: Mutex<Vec<SentEmail>>,
        failing: AtomicBool,
    }

    impl RecordingEmailGateway {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent sends fail with `TransportError::Unavailable`.
        pub fn fail_sends(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Every message delivered so far, oldest first.
        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        /// The most recent message, if any.
        pub fn last(&self) -> Option<SentEmail> {
            self.sent().pop()
        }
    }

    #[async_trait]
    impl EmailGateway for RecordingEmailGateway {
        async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), TransportError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TransportError::Unavailable("recording gateway set to fail".into()));
            }

            let mut sent = self
                .sent
                .lock()
                .map_err(|_| TransportError::Unavailable("recording gateway poisoned".into()))?;
            sent.push(SentEmail {
                to: to.to_string(),
                subject: subject.to_owned(),
                body: body.to_owned(),
            });
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    #[tokio::test]
    async fn test_disabled_gateway_fails() {
        let result = DisabledEmailGateway.send(&email(), "Subject", "Body").await;
        assert!(matches!(result, Err(TransportError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_recording_gateway_captures_and_fails() {
        let gateway = RecordingEmailGateway::new();
        gateway
            .send(&email(), "Confirm", "Visit http://h/confirm-email?token=abc-123 now")
            .await
            .unwrap();

        let last = gateway.last().unwrap();
        assert_eq!(last.to, "a@x.com");
        assert_eq!(last.token(), Some("abc-123"));

        gateway.fail_sends(true);
        assert!(gateway.send(&email(), "Again", "x").await.is_err());
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_smtp_gateway_builds_from_config() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: secrecy::SecretString::from("hunter2".to_string()),
            from_address: "Barberbook <noreply@example.com>".to_string(),
        };
        assert!(SmtpEmailGateway::new(&config).is_ok());
    }
}
