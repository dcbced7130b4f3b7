/**
 * Confirmation Mail Delivery
 *
 * Signup hands a composed [`OutgoingMail`] to a [`Mailer`]. Three transports
 * are provided:
 *
 * - [`SmtpMailer`] - lettre SMTP relay (STARTTLS), used when `SMTP_HOST` is set
 * - [`LogMailer`] - writes the mail to the log, used for local development
 * - [`MemoryMailer`] - keeps mails in memory so tests can read the links back
 */

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as MimeMessage, Tokio1Executor};
use thiserror::Error;

use crate::backend::i18n::{Locale, Message};
use crate::shared::config::SmtpSettings;
use crate::shared::Settings;

/// A plain-text mail ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Compose the confirmation mail for a new signup
pub fn confirmation_mail(settings: &Settings, locale: Locale, to: &str, token: &str) -> OutgoingMail {
    let link = settings.confirmation_url(token);
    OutgoingMail {
        to: to.to_string(),
        subject: locale.tr(Message::ConfirmationSubject {
            site_name: &settings.site_name,
        }),
        body: locale.tr(Message::ConfirmationBody {
            site_name: &settings.site_name,
            link: &link,
        }),
    }
}

/// Build the transport described by the settings
pub fn mailer_from_settings(settings: &Settings) -> Result<Arc<dyn Mailer>, MailError> {
    match &settings.smtp {
        Some(smtp) => {
            tracing::info!("Sending mail through SMTP relay {}", smtp.host);
            Ok(Arc::new(SmtpMailer::new(smtp, &settings.default_from_email)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set. Confirmation mails will only be logged.");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// SMTP relay transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpSettings, from: &str) -> Result<Self, MailError> {
        let from: Mailbox = from.parse()?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?;
        if let Some(port) = smtp.port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = MimeMessage::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport.send(message).await?;
        tracing::info!("Confirmation mail sent to {}", mail.to);
        Ok(())
    }
}

/// Development transport that logs mails instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mail not sent (no SMTP relay configured):\n{}",
            mail.body
        );
        Ok(())
    }
}

/// In-memory transport
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mails delivered so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<OutgoingMail> {
        self.sent().pop()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
        Ok(())
    }
}
