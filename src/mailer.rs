//! Outbound email: contact form notifications and visitor milestones.

use crate::config::SmtpConfig;
use crate::models::Contact;
use crate::retry::{with_retry_if, RetryOptions};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError>;
}

/// Send and log; delivery problems never fail the caller.
pub async fn deliver(mailer: &dyn Mailer, message: EmailMessage) -> bool {
    let subject = message.subject.clone();
    match mailer.send(message).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to send email '{}': {}", subject, e);
            false
        }
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Port 465 uses implicit TLS, anything else STARTTLS.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        // Building the pooled transport spawns onto the runtime, so reject a
        // bad sender first.
        let from: Mailbox = config.from.parse()?;

        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let mut builder = builder.port(config.port);
        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)?;

        with_retry_if(
            &RetryOptions::email(),
            "SMTP send",
            || self.transport.send(email.clone()),
            |e: &lettre::transport::smtp::Error| e.is_transient(),
        )
        .await?;

        info!("Sent email '{}' to {}", message.subject, message.to);
        Ok(())
    }
}

/// Used when SMTP is not configured: logs what would have been sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError> {
        info!(
            "SMTP not configured; email to {} not sent: {}",
            message.to, message.subject
        );
        Ok(())
    }
}

pub fn contact_notification(admin_email: &str, contact: &Contact) -> EmailMessage {
    let subject = match &contact.subject {
        Some(subject) => format!("New contact message: {}", subject),
        None => format!("New contact message from {}", contact.name),
    };

    EmailMessage {
        to: admin_email.to_string(),
        subject,
        body: format!(
            "Name: {}\nEmail: {}\n\n{}",
            contact.name, contact.email, contact.message
        ),
    }
}

/// Visitor counts that trigger a milestone email.
pub fn is_milestone(count: i64) -> bool {
    count > 0 && count % 100 == 0
}

pub fn milestone_notification(admin_email: &str, count: i64) -> EmailMessage {
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("Visitor milestone reached: {}", count),
        body: format!(
            "Your portfolio just welcomed visitor number {}.\n\nCongratulations!",
            count
        ),
    }
}
