//! Admin authentication: credential checks, lockout and session tokens.
//!
//! Flow Overview:
//! 1) Reserve the attempt; reject early while the username is locked out.
//! 2) Unknown usernames and wrong passwords keep the reservation as a failure.
//! 3) Non-admin users are refused and the reservation is released.
//! 4) Success clears the counter and a signed session token is issued.

use super::{
    audit::{AuditTrail, ClientInfo, LoginEvent},
    config::AuthConfig,
    error::{AuthError, CredentialFailure},
    lockout::AttemptTracker,
    password,
};
use crate::{
    store::{Role, User, UserRepository},
    token::{SessionCodec, TokenError},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

fn default_role() -> String {
    Role::Admin.as_str().to_string()
}

/// Claims carried by an admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminClaims {
    pub user_id: i64,
    pub username: String,
    #[serde(default = "default_role")]
    pub role: String,
}

impl AdminClaims {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub session: IssuedToken,
}

pub struct AdminAuthService {
    users: Arc<dyn UserRepository>,
    attempts: Arc<dyn AttemptTracker>,
    codec: SessionCodec,
    trail: AuditTrail,
}

impl std::fmt::Debug for AdminAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl AdminAuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        attempts: Arc<dyn AttemptTracker>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            attempts,
            codec: config.session_codec(),
            trail: AuditTrail::default(),
        }
    }

    /// Check a username/password pair against the stored admin.
    ///
    /// The attempt is reserved as a failure before the lookup, so parallel
    /// guesses cannot outrun the threshold. Success clears the record;
    /// `Forbidden` and internal failures give the reservation back.
    ///
    /// # Errors
    /// `Locked`, `InvalidCredentials`, `Forbidden`, or `Internal` when the
    /// store or the stored hash is unusable.
    #[instrument(skip(self, password))]
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.attempts
            .try_begin(username)
            .map_err(|locked| AuthError::Locked {
                window_minutes: locked.window_minutes,
            })?;

        let result = self.check_credentials(username, password).await;
        match &result {
            Ok(_) => {
                self.attempts.clear(username);
                debug!("Admin credentials accepted");
            }
            // The reservation stands as the recorded failure.
            Err(AuthError::InvalidCredentials(_)) => {}
            Err(_) => self.attempts.release(username),
        }
        result
    }

    async fn check_credentials(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.users.find_by_username(username).await.map_err(|err| {
            error!("Failed to look up admin user: {err}");
            AuthError::Internal
        })?;

        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials(
                CredentialFailure::UnknownUsername,
            ));
        };

        if user.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }

        let supplied = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&supplied, &hash))
            .await
            .map_err(|err| {
                error!("Password verification task failed: {err}");
                AuthError::Internal
            })?
            .map_err(|err| {
                error!("Stored password hash is unusable: {err}");
                AuthError::Internal
            })?;

        if matches {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials(
                CredentialFailure::WrongPassword,
            ))
        }
    }

    /// Sign an admin session for `user`.
    ///
    /// # Errors
    /// `Configuration` when no signing secret is set, `Internal` if signing fails.
    pub fn issue_session_token(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let claims = AdminClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
        };
        let token = self.codec.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_in: self.codec.ttl_seconds(),
        })
    }

    /// Verify an admin session token. Any failure yields `None`.
    #[must_use]
    pub fn verify_session_token(&self, token: &str) -> Option<AdminClaims> {
        match self.codec.verify::<AdminClaims>(token) {
            Ok(claims) => Some(claims),
            Err(err @ TokenError::MissingSecret { .. }) => {
                error!("Admin session verification is misconfigured: {err}");
                None
            }
            Err(_) => None,
        }
    }

    /// Validate credentials, issue a session and write the audit record.
    ///
    /// # Errors
    /// Whatever [`Self::validate_credentials`] or [`Self::issue_session_token`] return.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.validate_credentials(username, password).await {
            Ok(user) => user,
            Err(err) => {
                self.trail.record_failure(username, None, err.reason(), client);
                return Err(err);
            }
        };

        match self.issue_session_token(&user) {
            Ok(session) => {
                self.trail.record_success(&user.username, user.id, client);
                Ok(LoginOutcome { user, session })
            }
            Err(err) => {
                self.trail.record_failure(username, Some(user.id), err.reason(), client);
                Err(err)
            }
        }
    }

    /// Most recent login attempts, newest first.
    #[must_use]
    pub fn recent_logins(&self, limit: usize) -> Vec<LoginEvent> {
        self.trail.recent(limit)
    }

    /// Load the admin behind verified claims.
    ///
    /// # Errors
    /// `Internal` when the store fails.
    pub async fn find_admin(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = self.users.find_by_username(username).await.map_err(|err| {
            error!("Failed to look up admin user: {err}");
            AuthError::Internal
        })?;
        Ok(user.filter(|user| user.role == Role::Admin))
    }
}
