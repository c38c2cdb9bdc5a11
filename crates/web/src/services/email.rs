//! Email service for partnership request notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the partnership request notification.
#[derive(Template)]
#[template(path = "email/partnership_request.html")]
struct PartnershipRequestEmailHtml<'a> {
    creator_name: &'a str,
    idea_title: &'a str,
    investor_name: &'a str,
    investor_email: &'a str,
    message: &'a str,
    dashboard_url: &'a str,
}

/// Plain text template for the partnership request notification.
#[derive(Template)]
#[template(path = "email/partnership_request.txt")]
struct PartnershipRequestEmailText<'a> {
    creator_name: &'a str,
    idea_title: &'a str,
    investor_name: &'a str,
    investor_email: &'a str,
    message: &'a str,
    dashboard_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Details of a partnership request for the notification email.
pub struct PartnershipNotification<'a> {
    pub creator_name: &'a str,
    pub creator_email: &'a str,
    pub idea_title: &'a str,
    pub investor_name: &'a str,
    pub investor_email: &'a str,
    pub message: &'a str,
    pub dashboard_url: &'a str,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP connection fails.
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

    /// Notify an idea's creator that an investor requested a partnership.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_partnership_request(
        &self,
        notification: &PartnershipNotification<'_>,
    ) -> Result<(), EmailError> {
        let html = PartnershipRequestEmailHtml {
            creator_name: notification.creator_name,
            idea_title: notification.idea_title,
            investor_name: notification.investor_name,
            investor_email: notification.investor_email,
            message: notification.message,
            dashboard_url: notification.dashboard_url,
        }
        .render()?;
        let text = PartnershipRequestEmailText {
            creator_name: notification.creator_name,
            idea_title: notification.idea_title,
            investor_name: notification.investor_name,
            investor_email: notification.investor_email,
            message: notification.message,
            dashboard_url: notification.dashboard_url,
        }
        .render()?;

        let subject = format!(
            "New partnership request for \"{}\"",
            notification.idea_title
        );

        self.send_multipart_email(notification.creator_email, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
