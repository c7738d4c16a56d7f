//! SMTP email delivery via lettre

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::SmtpTransport;
use lettre::{Message, Transport};

use crate::error::{AppError, Result};

/// SMTP settings, read from the environment.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Sender mailbox, e.g. `Muxy <muxy@localhost>`.
    pub from_email: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        EmailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Muxy <muxy@localhost>".to_string()),
        }
    }
}

/// Plain-text email sender for publisher notifications.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        EmailService { config }
    }

    fn create_transport(&self) -> Result<SmtpTransport> {
        let mut builder = SmtpTransport::builder_dangerous(&self.config.smtp_host)
            .port(self.config.smtp_port);

        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }

    pub fn send(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: &str,
        body: String,
    ) -> Result<()> {
        let from: Mailbox = self
            .config
            .from_email
            .parse()
            .map_err(|e| AppError::Email(format!("invalid sender address: {}", e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Email(format!("invalid recipient address: {}", e)))?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = reply_to {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|e| AppError::Email(format!("invalid reply-to address: {}", e)))?;
            builder = builder.reply_to(mailbox);
        }

        let message = builder
            .body(body)
            .map_err(|e| AppError::Email(format!("failed to build message: {}", e)))?;

        self.create_transport()?
            .send(&message)
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }
}
