use crate::{
    auth::config::ENV_SECRET_KEY,
    cipher::LinkCipher,
    token::{SecretSource, SessionCodec},
};
use secrecy::SecretString;

pub const DEFAULT_LINK_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
pub const ENV_JWT_SECRET: &str = "TAUTAN_JWT_SECRET";

#[derive(Clone, Debug)]
pub struct LinkConfig {
    jwt_secret: Option<SecretString>,
    secret_key: Option<SecretString>,
    session_ttl_seconds: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_secret: None,
            secret_key: None,
            session_ttl_seconds: DEFAULT_LINK_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_jwt_secret(mut self, secret: Option<SecretString>) -> Self {
        self.jwt_secret = secret;
        self
    }

    #[must_use]
    pub fn with_secret_key(mut self, secret: Option<SecretString>) -> Self {
        self.secret_key = secret;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    /// Link sessions sign with the generic JWT secret, falling back to the shared key.
    #[must_use]
    pub fn session_codec(&self) -> SessionCodec {
        SessionCodec::new(
            SecretSource::new(
                ENV_JWT_SECRET,
                self.jwt_secret.clone(),
                ENV_SECRET_KEY,
                self.secret_key.clone(),
            ),
            self.session_ttl_seconds,
        )
    }

    /// The link cipher only ever uses the shared key.
    #[must_use]
    pub fn cipher(&self) -> LinkCipher {
        LinkCipher::new(self.secret_key.clone())
    }
}
