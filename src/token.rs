//! Signed, expiring session tokens (HS256 JWT).
//!
//! Claims are flattened next to the registered `iat`/`exp` fields so a
//! payload like `{ "userId": 1, "username": "admin", "role": "admin" }`
//! travels as a plain JWT body.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret is not configured (set {primary} or {fallback})")]
    MissingSecret {
        primary: &'static str,
        fallback: &'static str,
    },
    #[error("invalid token")]
    Invalid,
    #[error("failed to encode token")]
    Encode,
}

/// Claims plus issued-at and expiry, both in seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<C> {
    #[serde(flatten)]
    pub claims: C,
    pub iat: i64,
    pub exp: i64,
}

/// Sign `claims` valid for `ttl_seconds` from now.
///
/// # Errors
/// Returns `TokenError::Encode` if serialization fails.
pub fn sign<C: Serialize>(claims: &C, secret: &[u8], ttl_seconds: u64) -> Result<String, TokenError> {
    sign_at(claims, secret, ttl_seconds, Utc::now().timestamp())
}

/// Sign `claims` as if issued at `issued_at` (seconds since the epoch).
///
/// # Errors
/// Returns `TokenError::Encode` if serialization fails.
pub fn sign_at<C: Serialize>(
    claims: &C,
    secret: &[u8],
    ttl_seconds: u64,
    issued_at: i64,
) -> Result<String, TokenError> {
    let ttl = i64::try_from(ttl_seconds).map_err(|_| TokenError::Encode)?;
    let envelope = Envelope {
        claims,
        iat: issued_at,
        exp: issued_at.saturating_add(ttl),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &envelope,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| TokenError::Encode)
}

/// Verify signature, structure and expiry.
///
/// # Errors
/// Any failure collapses to `TokenError::Invalid`.
pub fn verify<C: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<Envelope<C>, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat"]);

    decode::<Envelope<C>>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
}

/// A primary secret with a shared fallback, resolved on every use.
#[derive(Clone)]
pub struct SecretSource {
    primary: Option<SecretString>,
    fallback: Option<SecretString>,
    primary_name: &'static str,
    fallback_name: &'static str,
}

impl SecretSource {
    #[must_use]
    pub fn new(
        primary_name: &'static str,
        primary: Option<SecretString>,
        fallback_name: &'static str,
        fallback: Option<SecretString>,
    ) -> Self {
        Self {
            primary,
            fallback,
            primary_name,
            fallback_name,
        }
    }

    /// # Errors
    /// Returns `TokenError::MissingSecret` naming both keys when neither is set.
    pub fn resolve(&self) -> Result<&SecretString, TokenError> {
        self.primary
            .as_ref()
            .filter(|secret| !secret.expose_secret().is_empty())
            .or_else(|| {
                self.fallback
                    .as_ref()
                    .filter(|secret| !secret.expose_secret().is_empty())
            })
            .ok_or(TokenError::MissingSecret {
                primary: self.primary_name,
                fallback: self.fallback_name,
            })
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSource")
            .field("primary_name", &self.primary_name)
            .field("primary_set", &self.primary.is_some())
            .field("fallback_name", &self.fallback_name)
            .field("fallback_set", &self.fallback.is_some())
            .finish()
    }
}

/// Signs and verifies one kind of session with a resolved secret and lifetime.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    secret: SecretSource,
    ttl_seconds: u64,
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: SecretSource, ttl_seconds: u64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// # Errors
    /// `MissingSecret` when unconfigured, `Encode` when signing fails.
    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        let secret = self.secret.resolve()?;
        sign(claims, secret.expose_secret().as_bytes(), self.ttl_seconds)
    }

    /// # Errors
    /// `MissingSecret` when unconfigured, `Invalid` for any verification failure.
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        let secret = self.secret.resolve()?;
        verify::<C>(token, secret.expose_secret().as_bytes()).map(|envelope| envelope.claims)
    }
}
