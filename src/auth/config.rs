use super::lockout::LockoutPolicy;
use crate::token::{SecretSource, SessionCodec};
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_ADMIN_TOKEN_TTL_SECONDS: u64 = 3600;
pub const ENV_JWT_SECRET_ADMIN: &str = "TAUTAN_JWT_SECRET_ADMIN";
pub const ENV_SECRET_KEY: &str = "TAUTAN_SECRET_KEY";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret_admin: Option<SecretString>,
    secret_key: Option<SecretString>,
    token_ttl_seconds: u64,
    lockout: LockoutPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_secret_admin: None,
            secret_key: None,
            token_ttl_seconds: DEFAULT_ADMIN_TOKEN_TTL_SECONDS,
            lockout: LockoutPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_jwt_secret_admin(mut self, secret: Option<SecretString>) -> Self {
        self.jwt_secret_admin = secret;
        self
    }

    #[must_use]
    pub fn with_secret_key(mut self, secret: Option<SecretString>) -> Self {
        self.secret_key = secret;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_lockout_threshold(mut self, threshold: u32) -> Self {
        self.lockout.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lockout_window(mut self, window: Duration) -> Self {
        self.lockout.window = window;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> u64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn lockout(&self) -> LockoutPolicy {
        self.lockout
    }

    /// Admin sessions sign with the admin secret, falling back to the shared key.
    #[must_use]
    pub fn session_codec(&self) -> SessionCodec {
        SessionCodec::new(
            SecretSource::new(
                ENV_JWT_SECRET_ADMIN,
                self.jwt_secret_admin.clone(),
                ENV_SECRET_KEY,
                self.secret_key.clone(),
            ),
            self.token_ttl_seconds,
        )
    }
}
