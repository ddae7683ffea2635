//! Email Service
//!
//! Renders the account confirmation and password reset emails and hands them
//! to a [`Mailer`] for delivery.

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{debug, error, info};
use std::sync::Arc;
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::utils::error::{AppError, AppResult};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Delivery backend for rendered emails
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let builder = if config.smtp_ssl_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &config.smtp_host,
            ))
        }
        .map_err(|e| AppError::Configuration(format!("Failed to configure SMTP relay: {}", e)))?
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Checks that the SMTP server accepts connections
    pub async fn test_connection(&self) -> AppResult<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::ExternalService(
                "SMTP server rejected the connection".to_string(),
            )),
            Err(e) => Err(AppError::ExternalService(format!(
                "SMTP connection failed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient email: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(email.html_body),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email '{}' sent to {}", email.subject, email.to);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email to {}: {}", email.to, e);
                Err(AppError::ExternalService(format!("Failed to send email: {}", e)))
            }
        }
    }
}

/// Writes emails to the log instead of sending them; used when SMTP is not configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        info!(
            "SMTP not configured; email '{}' for {}:\n{}",
            email.subject, email.to, email.text_body
        );
        Ok(())
    }
}

const CONFIRM_SUBJECT: &str = "Confirm your email";
const RESET_SUBJECT: &str = "Important: Update your account information";

const CONFIRM_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Confirm your email</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
        .content { background: white; padding: 30px; border: 1px solid #dee2e6; }
        .button { display: inline-block; padding: 12px 24px; background: #007bff; color: white; text-decoration: none; border-radius: 4px; margin: 20px 0; }
        .footer { padding: 20px; text-align: center; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="content">
        <p>Hello {{ username }},</p>
        <p>Thanks for registering with {{ app_name }}. Please confirm your email address:</p>
        <p><a class="button" href="{{ link }}">Confirm email</a></p>
        <p>If the button does not work, open this link: {{ link }}</p>
        <p>If you didn't create an account, you can safely ignore this email.</p>
    </div>
    <div class="footer">&copy; {{ current_year }} {{ app_name }}</div>
</body>
</html>
"#;

const CONFIRM_TEXT: &str = r#"Hello {{ username }},

Thanks for registering with {{ app_name }}. Please confirm your email address by opening this link:

{{ link }}

If you didn't create an account, you can safely ignore this email.
"#;

const RESET_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password reset</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
        .content { background: white; padding: 30px; border: 1px solid #dee2e6; }
        .button { display: inline-block; padding: 12px 24px; background: #dc3545; color: white; text-decoration: none; border-radius: 4px; margin: 20px 0; }
        .footer { padding: 20px; text-align: center; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="content">
        <p>Hello {{ username }},</p>
        <p>A password change was requested for your {{ app_name }} account. Follow the link to apply the new password:</p>
        <p><a class="button" href="{{ link }}">Confirm password change</a></p>
        <p>If the button does not work, open this link: {{ link }}</p>
        <p>If you did not request this change, ignore this email and your password stays the same.</p>
    </div>
    <div class="footer">&copy; {{ current_year }} {{ app_name }}</div>
</body>
</html>
"#;

const RESET_TEXT: &str = r#"Hello {{ username }},

A password change was requested for your {{ app_name }} account. Open this link to apply the new password:

{{ link }}

If you did not request this change, ignore this email and your password stays the same.
"#;

/// Email service for the account emails
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    templates: Tera,
    base_url: String,
    app_name: String,
}

impl EmailService {
    /// Create a new email service; `base_url` prefixes the links in emails
    pub fn new(mailer: Arc<dyn Mailer>, base_url: &str, app_name: &str) -> AppResult<Self> {
        let mut templates = Tera::default();
        Self::add_embedded_templates(&mut templates)?;
        debug!("Loaded embedded email templates");

        Ok(Self {
            mailer,
            templates,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
        })
    }

    fn add_embedded_templates(tera: &mut Tera) -> AppResult<()> {
        tera.add_raw_templates(vec![
            ("confirm_email.html", CONFIRM_HTML),
            ("confirm_email.txt", CONFIRM_TEXT),
            ("reset_password.html", RESET_HTML),
            ("reset_password.txt", RESET_TEXT),
        ])
        .map_err(|e| AppError::Configuration(format!("Failed to add email templates: {}", e)))
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/api/auth/confirmed_email/{}", self.base_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/api/auth/confirm_reset_password/{}", self.base_url, token)
    }

    fn render(
        &self,
        template: &str,
        to: &str,
        subject: &str,
        username: &str,
        link: &str,
    ) -> AppResult<OutgoingEmail> {
        let mut context = Context::new();
        context.insert("username", username);
        context.insert("link", link);
        context.insert("app_name", &self.app_name);
        context.insert("current_year", &chrono::Utc::now().year());

        let html_body = self
            .templates
            .render(&format!("{}.html", template), &context)
            .map_err(|e| AppError::Internal(format!("Failed to render HTML template: {}", e)))?;

        let text_body = self
            .templates
            .render(&format!("{}.txt", template), &context)
            .map_err(|e| AppError::Internal(format!("Failed to render text template: {}", e)))?;

        Ok(OutgoingEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body,
            text_body,
        })
    }

    /// Render the email-confirmation message for a verification token
    pub fn render_confirmation(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> AppResult<OutgoingEmail> {
        self.render(
            "confirm_email",
            to,
            CONFIRM_SUBJECT,
            username,
            &self.confirmation_link(token),
        )
    }

    /// Render the password-reset message for a reset token
    pub fn render_password_reset(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> AppResult<OutgoingEmail> {
        self.render(
            "reset_password",
            to,
            RESET_SUBJECT,
            username,
            &self.reset_link(token),
        )
    }

    pub async fn send_email_confirmation(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> AppResult<()> {
        info!("Sending confirmation email to: {}", to);
        let email = self.render_confirmation(to, username, token)?;
        self.mailer.deliver(email).await
    }

    pub async fn send_reset_password_email(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> AppResult<()> {
        info!("Sending password reset email to: {}", to);
        let email = self.render_password_reset(to, username, token)?;
        self.mailer.deliver(email).await
    }
}
