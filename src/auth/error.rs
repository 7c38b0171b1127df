use crate::token::TokenError;
use std::fmt;

/// Which credential check failed. Both count toward the lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownUsername,
    WrongPassword,
}

impl fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownUsername => "Username tidak ditemukan",
            Self::WrongPassword => "Password tidak sesuai",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(CredentialFailure),
    #[error(
        "Akun terkunci karena terlalu banyak percobaan login gagal. Coba lagi dalam {window_minutes} menit."
    )]
    Locked { window_minutes: u64 },
    #[error("User ini bukan admin")]
    Forbidden,
    #[error("{0}")]
    Configuration(String),
    #[error("internal error")]
    Internal,
}

impl AuthError {
    /// Short reason tag for the login audit trail.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCredentials(CredentialFailure::UnknownUsername) => "unknown_username",
            Self::InvalidCredentials(CredentialFailure::WrongPassword) => "wrong_password",
            Self::Locked { .. } => "locked",
            Self::Forbidden => "not_admin",
            Self::Configuration(_) => "configuration",
            Self::Internal => "internal",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingSecret { .. } => Self::Configuration(err.to_string()),
            TokenError::Invalid | TokenError::Encode => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_keep_distinct_messages() {
        assert_eq!(
            AuthError::InvalidCredentials(CredentialFailure::UnknownUsername).to_string(),
            "Username tidak ditemukan"
        );
        assert_eq!(
            AuthError::InvalidCredentials(CredentialFailure::WrongPassword).to_string(),
            "Password tidak sesuai"
        );
    }

    #[test]
    fn locked_message_names_window() {
        let message = AuthError::Locked { window_minutes: 15 }.to_string();
        assert!(message.contains("15 menit"));
    }

    #[test]
    fn missing_secret_is_configuration() {
        let err = AuthError::from(TokenError::MissingSecret {
            primary: "TAUTAN_JWT_SECRET_ADMIN",
            fallback: "TAUTAN_SECRET_KEY",
        });
        assert!(matches!(err, AuthError::Configuration(_)));
        assert_eq!(err.reason(), "configuration");
    }
}
