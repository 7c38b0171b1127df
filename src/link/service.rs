//! Link lifecycle: token issuance, single-use consumption and URL rendering.
//!
//! Flow Overview:
//! 1) `generate_tokens_for_all_respondents` encrypts "name,email" per
//!    respondent and upserts the link, resetting it to unused.
//! 2) `consume` trades an unused raw token for the form URL plus a session
//!    token. The flip to used is a conditional write; only one caller wins.
//! 3) A later visit presents the session token instead and gets the same
//!    form URL back without touching the store.

use super::{
    config::LinkConfig,
    error::{LinkError, MSG_LINK_NOT_FOUND, MSG_NO_RECIPIENTS, MSG_TOKEN_NOT_FOUND},
    template,
};
use crate::{
    cipher::LinkCipher,
    mailer::{dispatch_sequential, DispatchResult, Mailer, OutgoingMail},
    store::{Link, LinkRepository, RespondentRepository},
    token::{SessionCodec, TokenError},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

pub const MSG_FORM_NOT_SET: &str = "Tautan form belum diatur";
pub const MSG_RESPONDENT_NOT_FOUND: &str = "Responden tidak ditemukan";

/// Claims carried by a link session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkClaims {
    pub token: String,
    #[serde(rename = "tautanForm")]
    pub form_url: String,
}

/// Result of a successful consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed {
    pub form_url: String,
    /// Present only on the first, state-changing consumption.
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BulkInvitation {
    pub subject: String,
    pub html_template: Option<String>,
    pub text_template: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BulkReport {
    pub message: String,
    pub total: usize,
    pub sent: usize,
    pub results: Vec<DispatchResult>,
}

pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    respondents: Arc<dyn RespondentRepository>,
    mailer: Arc<dyn Mailer>,
    cipher: LinkCipher,
    codec: SessionCodec,
}

impl std::fmt::Debug for LinkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkService")
            .field("cipher", &self.cipher)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_base_url(base: &str) -> Result<String, LinkError> {
    let trimmed = base.trim();
    Url::parse(trimmed).map_err(|_| LinkError::Validation("Link tidak valid".to_string()))?;
    Ok(trimmed.to_string())
}

impl LinkService {
    #[must_use]
    pub fn new(
        links: Arc<dyn LinkRepository>,
        respondents: Arc<dyn RespondentRepository>,
        mailer: Arc<dyn Mailer>,
        config: &LinkConfig,
    ) -> Self {
        Self {
            links,
            respondents,
            mailer,
            cipher: config.cipher(),
            codec: config.session_codec(),
        }
    }

    /// # Errors
    /// `Configuration` without a key, `Internal` if encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, LinkError> {
        Ok(self.cipher.encrypt(plaintext)?)
    }

    /// # Errors
    /// `Decryption` for any malformed or foreign token.
    pub fn decrypt(&self, token: &str) -> Result<String, LinkError> {
        Ok(self.cipher.decrypt(token)?)
    }

    /// Issue a fresh token for every respondent. Returns how many links were written.
    ///
    /// # Errors
    /// Cipher or store failures.
    #[instrument(skip(self))]
    pub async fn generate_tokens_for_all_respondents(&self) -> Result<usize, LinkError> {
        let respondents = self.respondents.list().await?;
        for respondent in &respondents {
            let token = self.encrypt(&format!("{},{}", respondent.name, respondent.email))?;
            self.links
                .upsert_for_respondent(respondent.id, &token)
                .await?;
        }
        info!(count = respondents.len(), "Generated link tokens");
        Ok(respondents.len())
    }

    /// Resolve a form URL from a session token or a raw, unused link token.
    ///
    /// A valid session wins. An invalid session falls back to the raw token
    /// when one is supplied.
    ///
    /// # Errors
    /// `NotFound` for unknown, spent or unconfigured links; `Configuration`
    /// when no signing secret is set.
    #[instrument(skip_all)]
    pub async fn consume(
        &self,
        raw_token: Option<&str>,
        session_token: Option<&str>,
    ) -> Result<Consumed, LinkError> {
        let raw_token = non_empty(raw_token);

        if let Some(session) = non_empty(session_token) {
            match self.codec.verify::<LinkClaims>(session) {
                Ok(claims) => {
                    debug!("Link reopened with session token");
                    return Ok(Consumed {
                        form_url: claims.form_url,
                        session_token: None,
                    });
                }
                Err(err @ TokenError::MissingSecret { .. }) => return Err(err.into()),
                Err(_) if raw_token.is_some() => {
                    debug!("Session token rejected, falling back to raw token");
                }
                Err(_) => return Err(LinkError::NotFound(MSG_TOKEN_NOT_FOUND.to_string())),
            }
        }

        let Some(token) = raw_token else {
            return Err(LinkError::NotFound(MSG_TOKEN_NOT_FOUND.to_string()));
        };

        let link = self
            .links
            .find_unused_by_token(token)
            .await?
            .ok_or_else(|| LinkError::NotFound(MSG_LINK_NOT_FOUND.to_string()))?;

        let Some(form_url) = link.form_url else {
            return Err(LinkError::NotFound(MSG_FORM_NOT_SET.to_string()));
        };

        let session = self.codec.sign(&LinkClaims {
            token: link.token.clone(),
            form_url: form_url.clone(),
        })?;

        if !self.links.mark_used(&link.token, &session, Utc::now()).await? {
            // Someone else flipped it between the read and our write.
            return Err(LinkError::NotFound(MSG_LINK_NOT_FOUND.to_string()));
        }

        info!(link_id = link.id, "Link consumed");
        Ok(Consumed {
            form_url,
            session_token: Some(session),
        })
    }

    /// Regenerate every token, then point each landing URL at `base?data=<token>`.
    ///
    /// # Errors
    /// `Validation` for a malformed base URL, or cipher/store failures.
    #[instrument(skip(self))]
    pub async fn set_landing_page_link(&self, base: &str) -> Result<usize, LinkError> {
        let base = parse_base_url(base)?;
        self.generate_tokens_for_all_respondents().await?;

        let links = self.links.list_links().await?;
        for link in &links {
            let landing = format!("{base}?data={}", link.token);
            self.links.update_landing_url(link.id, &landing).await?;
        }
        Ok(links.len())
    }

    /// Point every link at the same form URL.
    ///
    /// # Errors
    /// `Validation` for a malformed URL, or store failures.
    #[instrument(skip(self))]
    pub async fn set_form_link(&self, base: &str) -> Result<u64, LinkError> {
        let base = parse_base_url(base)?;
        Ok(self.links.update_form_urls(&base).await?)
    }

    /// Personalize and send one invitation per link with a landing URL.
    ///
    /// # Errors
    /// `Validation` without a subject or template, `NotFound` when no link
    /// has a landing URL yet.
    #[instrument(skip_all)]
    pub async fn send_bulk_invitations(
        &self,
        invitation: &BulkInvitation,
    ) -> Result<BulkReport, LinkError> {
        if invitation.subject.trim().is_empty() {
            return Err(LinkError::Validation("Subjek tidak boleh kosong".to_string()));
        }
        let html = non_empty(invitation.html_template.as_deref());
        let text = non_empty(invitation.text_template.as_deref());
        if html.is_none() && text.is_none() {
            return Err(LinkError::Validation(
                "htmlTemplate atau textTemplate wajib diisi".to_string(),
            ));
        }

        let recipients = self.links.find_all_with_landing_url().await?;
        if recipients.is_empty() {
            return Err(LinkError::NotFound(MSG_NO_RECIPIENTS.to_string()));
        }

        let mails: Vec<OutgoingMail> = recipients
            .iter()
            .map(|recipient| OutgoingMail {
                to: recipient.email.clone(),
                subject: invitation.subject.clone(),
                text: text.map(|t| template::render(t, &recipient.name, &recipient.landing_url)),
                html: html.map(|h| template::render(h, &recipient.name, &recipient.landing_url)),
            })
            .collect();

        let results = dispatch_sequential(self.mailer.as_ref(), &mails).await;
        let sent = results.iter().filter(|r| r.success).count();
        let total = recipients.len();

        Ok(BulkReport {
            message: format!("Berhasil mengirim {sent} email dari {total} total responden."),
            total,
            sent,
            results,
        })
    }

    /// Create a link with an explicit token for an existing respondent.
    ///
    /// # Errors
    /// `Validation` for a missing respondent or empty fields, `Conflict` when
    /// the respondent already has a link.
    #[instrument(skip(self, token))]
    pub async fn create_link(
        &self,
        respondent_id: i64,
        form_url: &str,
        token: &str,
    ) -> Result<Link, LinkError> {
        if token.trim().is_empty() {
            return Err(LinkError::Validation("Token tidak boleh kosong".to_string()));
        }
        let form_url = parse_base_url(form_url)?;
        if self.respondents.find(respondent_id).await?.is_none() {
            return Err(LinkError::Validation(MSG_RESPONDENT_NOT_FOUND.to_string()));
        }
        Ok(self
            .links
            .create_link(respondent_id, &form_url, token.trim())
            .await?)
    }
}
