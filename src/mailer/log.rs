use super::{new_message_id, Mailer, MailerError, OutgoingMail, SendReceipt};
use async_trait::async_trait;
use tracing::info;

/// Local dev mailer that logs the message instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, MailerError> {
        mail.ensure_body()?;
        let message_id = new_message_id();
        info!(
            to = %mail.to,
            subject = %mail.subject,
            has_text = mail.text.is_some(),
            has_html = mail.html.is_some(),
            message_id = %message_id,
            "email send stub"
        );
        Ok(SendReceipt { message_id })
    }
}
