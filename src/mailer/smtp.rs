//! SMTP sender over an implicit-TLS relay.

use super::{new_message_id, Mailer, MailerError, OutgoingMail, SendReceipt};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

pub const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(host: String, from_email: String) -> Self {
        Self {
            host,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from_email,
            from_name: None,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: String, password: SecretString) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_from_name(mut self, name: Option<String>) -> Self {
        self.from_name = name.filter(|name| !name.is_empty());
        self
    }

    /// # Errors
    /// `InvalidAddress` if the configured sender does not parse.
    pub fn from_mailbox(&self) -> Result<Mailbox, MailerError> {
        let raw = match &self.from_name {
            Some(name) => format!("\"{name}\" <{}>", self.from_email),
            None => self.from_email.clone(),
        };
        raw.parse()
            .map_err(|err| MailerError::InvalidAddress(format!("{raw}: {err}")))
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// # Errors
    /// Fails when the relay host or the sender address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|err| MailerError::Transport(err.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        info!(host = %config.host, port = config.port, "SMTP transport configured");

        Ok(Self {
            transport: builder.build(),
            from: config.from_mailbox()?,
        })
    }

    /// Verify the relay accepts connections.
    ///
    /// # Errors
    /// `Transport` when the connection test fails.
    pub async fn test_connection(&self) -> Result<bool, MailerError> {
        self.transport
            .test_connection()
            .await
            .map_err(|err| MailerError::Transport(err.to_string()))
    }
}

/// Build the MIME message: a single part, or multipart/alternative when both
/// bodies are present.
pub(crate) fn build_message(
    from: Mailbox,
    mail: &OutgoingMail,
    message_id: String,
) -> Result<Message, MailerError> {
    mail.ensure_body()?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|err| MailerError::InvalidAddress(format!("{}: {err}", mail.to)))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone())
        .message_id(Some(message_id));

    let text = mail.text.clone().filter(|s| !s.is_empty());
    let html = mail.html.clone().filter(|s| !s.is_empty());
    let message = match (text, html) {
        (Some(text), Some(html)) => {
            builder.multipart(MultiPart::alternative_plain_html(text, html))
        }
        (Some(text), None) => builder.singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text),
        ),
        (None, Some(html)) => builder.singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html),
        ),
        (None, None) => return Err(MailerError::EmptyBody),
    };
    message.map_err(|err| MailerError::Build(err.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, mail), fields(to = %mail.to))]
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, MailerError> {
        let message_id = new_message_id();
        let message = build_message(self.from.clone(), mail, message_id.clone())?;

        self.transport
            .send(message)
            .await
            .map_err(|err| MailerError::Transport(err.to_string()))?;

        info!(message_id = %message_id, "Email sent");
        Ok(SendReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig::new("smtp.example.com".to_string(), "noreply@example.com".to_string())
            .with_from_name(Some("Survey Team".to_string()))
    }

    fn mail(text: Option<&str>, html: Option<&str>) -> OutgoingMail {
        OutgoingMail {
            to: "ani@example.com".to_string(),
            subject: "Undangan".to_string(),
            text: text.map(str::to_string),
            html: html.map(str::to_string),
        }
    }

    #[test]
    fn from_mailbox_includes_name() -> Result<(), MailerError> {
        let mailbox = config().from_mailbox()?;
        assert_eq!(mailbox.email.to_string(), "noreply@example.com");
        assert_eq!(mailbox.name.as_deref(), Some("Survey Team"));
        Ok(())
    }

    #[test]
    fn both_bodies_become_alternative() -> Result<(), MailerError> {
        let from = config().from_mailbox()?;
        let message = build_message(
            from,
            &mail(Some("hello"), Some("<p>hello</p>")),
            "<id@tautan>".to_string(),
        )?;
        let raw = String::from_utf8(message.formatted()).map_err(|e| MailerError::Build(e.to_string()))?;
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Message-ID: <id@tautan>"));
        Ok(())
    }

    #[test]
    fn html_only_is_single_part() -> Result<(), MailerError> {
        let from = config().from_mailbox()?;
        let message = build_message(from, &mail(None, Some("<p>x</p>")), "<id@tautan>".to_string())?;
        let raw = String::from_utf8(message.formatted()).map_err(|e| MailerError::Build(e.to_string()))?;
        assert!(raw.contains("text/html"));
        assert!(!raw.contains("multipart"));
        Ok(())
    }

    #[test]
    fn rejects_bad_recipient_and_empty_body() -> Result<(), MailerError> {
        let from = config().from_mailbox()?;
        let mut bad = mail(Some("x"), None);
        bad.to = "not-an-address".to_string();
        assert!(matches!(
            build_message(from.clone(), &bad, "<id@tautan>".to_string()),
            Err(MailerError::InvalidAddress(_))
        ));
        assert!(matches!(
            build_message(from, &mail(None, None), "<id@tautan>".to_string()),
            Err(MailerError::EmptyBody)
        ));
        Ok(())
    }
}
