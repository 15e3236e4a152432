use std::sync::{Arc, Mutex};

use askama::Template;
use async_trait::async_trait;
use lettre::{
    message::MultiPart, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::{config::SmtpConfig, error::AppError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| AppError::Config(format!("invalid SMTP_HOST: {err}")))?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            from: from.to_string(),
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|err| AppError::Mail(format!("invalid sender: {err}")))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|err| AppError::Mail(format!("invalid recipient: {err}")))?)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .map_err(|err| AppError::Mail(err.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|err| AppError::Mail(err.to_string()))?;
        Ok(())
    }
}

/// Writes mail to the log instead of delivering it. Used when no SMTP relay is
/// configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        info!(to = %mail.to, subject = %mail.subject, "mail not delivered (no SMTP relay)\n{}", mail.text);
        Ok(())
    }
}

/// Keeps every message in memory so tests can inspect what was sent.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_to(&self, recipient: &str) -> Option<OutgoingMail> {
        self.sent().into_iter().rev().find(|mail| mail.to == recipient)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
        Ok(())
    }
}

pub fn build_mailer(smtp: Option<&SmtpConfig>, from: &str) -> Result<Arc<dyn Mailer>, AppError> {
    match smtp {
        Some(config) => Ok(Arc::new(SmtpMailer::new(config, from)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: i64,
}

pub fn password_reset_mail(
    to: &str,
    name: &str,
    code: &str,
    ttl_minutes: i64,
) -> Result<OutgoingMail, AppError> {
    let text = PasswordResetText {
        name,
        code,
        ttl_minutes,
    }
    .render()
    .map_err(|err| AppError::Other(err.into()))?;
    let html = PasswordResetHtml {
        name,
        code,
        ttl_minutes,
    }
    .render()
    .map_err(|err| AppError::Other(err.into()))?;

    Ok(OutgoingMail {
        to: to.to_string(),
        subject: "TripMate password reset code".into(),
        text,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_mail_carries_the_code_in_both_bodies() {
        let mail = password_reset_mail("ana@example.com", "Ana", "123456", 15).expect("render");
        assert_eq!(mail.to, "ana@example.com");
        assert!(mail.text.contains("123456"));
        assert!(mail.html.contains("123456"));
        assert!(mail.text.contains("15 minutes"));
    }

    #[test]
    fn html_body_escapes_the_name() {
        let mail = password_reset_mail("x@example.com", "<b>", "000000", 15).expect("render");
        assert!(mail.html.contains("&lt;b&gt;"));
        assert!(mail.text.contains("<b>"));
    }

    #[tokio::test]
    async fn memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        let mail = password_reset_mail("ana@example.com", "Ana", "111111", 15).expect("render");
        mailer.send(mail.clone()).await.expect("send");
        assert_eq!(mailer.last_to("ana@example.com"), Some(mail));
        assert!(mailer.last_to("bob@example.com").is_none());
    }
}
