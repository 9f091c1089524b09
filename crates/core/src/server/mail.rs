//! SMTP delivery for transactional email.
//!
//! Each binary renders its own templates and hands the finished text and
//! HTML bodies to a [`Mailer`].

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::env::{self, ConfigError};
use crate::Email;

/// SMTP relay settings. `Debug` redacts the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SmtpConfig {
    /// Read `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`
    /// and `SMTP_FROM`. Email is off when `SMTP_HOST` is unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is set but the rest is incomplete.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = env::optional("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: env::parse_or("SMTP_PORT", "587")?,
            username: env::required("SMTP_USERNAME")?,
            password: env::credential("SMTP_PASSWORD")?,
            from_address: env::required("SMTP_FROM")?,
        }))
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// STARTTLS relay with a fixed sender.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    /// # Errors
    ///
    /// Returns an error if the relay host is unusable or the sender address
    /// does not parse.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = config
            .from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from_address.clone()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    /// Send one text/HTML alternative message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or the relay refuses it.
    pub async fn send(
        &self,
        to: &Email,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), MailError> {
        let recipient = to
            .as_str()
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_PLAIN).body(text_body))
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_HTML).body(html_body)),
            )?;

        self.transport.send(message).await?;
        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }

    /// Send the same message to every recipient.
    ///
    /// # Errors
    ///
    /// Returns the first failure after attempting everyone.
    pub async fn send_to_all(
        &self,
        recipients: &[Email],
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        let mut first_error = None;
        for to in recipients {
            if let Err(e) = self
                .send(to, subject, text_body.to_string(), html_body.to_string())
                .await
            {
                tracing::warn!(to = %to, error = %e, "Failed to send email");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
