//! Outgoing mail. Only password resets send mail today.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}

/// Writes mails to the log; used when no delivery webhook is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        log::info!(
            "Mail delivery not configured, would send '{}' from {} to {}:\n{}",
            mail.subject,
            mail.from,
            mail.to,
            mail.html
        );
        Ok(())
    }
}

/// Hands mails to an HTTP relay as JSON `{from, to, subject, html}`.
pub struct WebhookMailer {
    http: reqwest::Client,
    url: String,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let response = self.http.post(&self.url).json(&mail).send().await.map_err(|e| {
            log::error!("Mail relay unreachable: {}", e);
            AppError::InternalServerError("Failed to send email.".into())
        })?;
        if !response.status().is_success() {
            log::error!("Mail relay rejected mail to {}: {}", mail.to, response.status());
            return Err(AppError::InternalServerError("Failed to send email.".into()));
        }
        log::info!("Mail '{}' sent to {}", mail.subject, mail.to);
        Ok(())
    }
}

pub fn from_config(config: &Config) -> Arc<dyn Mailer> {
    match &config.mail_webhook_url {
        Some(url) => Arc::new(WebhookMailer::new(url.clone())),
        None => Arc::new(LogMailer),
    }
}

pub fn password_reset_mail(from: &str, to: &str, display_name: &str, reset_link: &str) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Password Reset Request - ESS Portal".to_string(),
        html: format!(
            "<p>Hi {name},</p>\
             <p>You requested a password reset for your ESS Portal account.</p>\
             <p>Please click the link below to set a new password. This link is valid for 60 minutes:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>If you did not request this, please ignore this email.</p>",
            name = html_escape::encode_text(display_name),
            link = html_escape::encode_double_quoted_attribute(reset_link)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_mail_contains_link() {
        let mail = password_reset_mail(
            "no-reply@ess.local",
            "jane@acme.test",
            "Jane Doe",
            "http://localhost:3000/reset-password?token=abc",
        );
        assert_eq!(mail.to, "jane@acme.test");
        assert!(mail.html.contains("Hi Jane Doe"));
        assert!(mail.html.contains("http://localhost:3000/reset-password?token=abc"));
    }

    #[test]
    fn test_password_reset_mail_escapes_user_text() {
        let mail = password_reset_mail(
            "no-reply@ess.local",
            "jane@acme.test",
            "<script>alert(1)</script> & \"Co\"",
            "http://localhost:3000/reset-password?token=a\"b",
        );
        assert!(!mail.html.contains("<script>"));
        assert!(mail.html.contains("Hi &lt;script&gt;alert(1)&lt;/script&gt; &amp;"));
        assert!(!mail.html.contains("token=a\"b"));
        assert!(mail.html.contains("token=a&quot;b"));
    }

    #[actix_rt::test]
    async fn test_log_mailer_always_succeeds() {
        let mail = password_reset_mail("a@b.test", "c@d.test", "C", "http://x");
        assert!(LogMailer.send(mail).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_webhook_mailer_fails_when_unreachable() {
        let mailer = WebhookMailer::new("http://127.0.0.1:9/mail");
        let mail = password_reset_mail("a@b.test", "c@d.test", "C", "http://x");
        assert!(matches!(
            mailer.send(mail).await,
            Err(AppError::InternalServerError(_))
        ));
    }
}
