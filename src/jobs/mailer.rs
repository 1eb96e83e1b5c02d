use async_trait::async_trait;

use crate::errors::AppResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Outgoing mail. Delivery is up to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> AppResult<()>;
}

/// Writes each message to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        log::info!(
            "Mail from {} to {}: '{}' ({} attachment(s))",
            self.from,
            email.to,
            email.subject,
            email.attachments.len()
        );
        if let Some(body) = email.text_body.as_deref() {
            log::debug!("Text body:\n{}", body);
        }
        for attachment in &email.attachments {
            log::debug!(
                "Attachment {} [{}] {} bytes",
                attachment.filename,
                attachment.content_type,
                attachment.data.len()
            );
        }
        Ok(())
    }
}
