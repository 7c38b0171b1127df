//! Outbound mail.
//!
//! `SmtpMailer` talks to a real relay; `LogMailer` only logs and is used when
//! no SMTP host is configured. Batches go through [`dispatch_sequential`],
//! which sends one message at a time and never aborts on a single failure.

pub mod log;
pub mod smtp;

pub use self::log::LogMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("text or html is required")]
    EmptyBody,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl OutgoingMail {
    /// # Errors
    /// `EmptyBody` when neither text nor html is present.
    pub fn ensure_body(&self) -> Result<(), MailerError> {
        let present = |part: &Option<String>| part.as_deref().is_some_and(|s| !s.is_empty());
        if present(&self.text) || present(&self.html) {
            Ok(())
        } else {
            Err(MailerError::EmptyBody)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: String,
}

/// Outcome of one message in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub to: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, MailerError>;
}

pub(crate) fn new_message_id() -> String {
    format!("<{}@tautan>", uuid::Uuid::new_v4())
}

/// Send `mails` one after another, in order, recording each outcome.
pub async fn dispatch_sequential(mailer: &dyn Mailer, mails: &[OutgoingMail]) -> Vec<DispatchResult> {
    let mut results = Vec::with_capacity(mails.len());
    for mail in mails {
        let result = match mailer.send(mail).await {
            Ok(receipt) => DispatchResult {
                to: mail.to.clone(),
                success: true,
                message_id: Some(receipt.message_id),
                error: None,
            },
            Err(err) => {
                warn!(to = %mail.to, "Failed to send email: {err}");
                DispatchResult {
                    to: mail.to.clone(),
                    success: false,
                    message_id: None,
                    error: Some(err.to_string()),
                }
            }
        };
        results.push(result);
    }
    info!(
        sent = results.iter().filter(|r| r.success).count(),
        total = mails.len(),
        "Batch dispatch finished"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyMailer {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, MailerError> {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(mail.to.clone());
            if mail.to.starts_with("bad") {
                Err(MailerError::Transport("connection refused".to_string()))
            } else {
                Ok(SendReceipt {
                    message_id: format!("<{}>", mail.to),
                })
            }
        }
    }

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            to: to.to_string(),
            subject: "hi".to_string(),
            text: Some("body".to_string()),
            html: None,
        }
    }

    #[tokio::test]
    async fn failures_do_not_abort_batch() {
        let mailer = FlakyMailer {
            seen: Mutex::new(Vec::new()),
        };
        let batch = [mail("a@x.io"), mail("bad@x.io"), mail("c@x.io")];
        let results = dispatch_sequential(&mailer, &batch).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(
            results[1].error.as_deref(),
            Some("transport error: connection refused")
        );
        assert!(results[2].success);
        assert_eq!(
            *mailer.seen.lock().expect("lock"),
            vec!["a@x.io", "bad@x.io", "c@x.io"]
        );
    }

    #[test]
    fn body_is_required() {
        let mut m = mail("a@x.io");
        assert!(m.ensure_body().is_ok());
        m.text = None;
        assert!(matches!(m.ensure_body(), Err(MailerError::EmptyBody)));
        m.html = Some("<p>hi</p>".to_string());
        assert!(m.ensure_body().is_ok());
    }

    #[test]
    fn message_ids_are_unique() {
        let a = new_message_id();
        assert!(a.starts_with('<') && a.ends_with("@tautan>"));
        assert_ne!(a, new_message_id());
    }
}
