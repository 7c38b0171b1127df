use crate::{cipher::CipherError, store::StoreError, token::TokenError};

pub const MSG_LINK_NOT_FOUND: &str = "Tautan tidak ditemukan atau sudah digunakan";
pub const MSG_TOKEN_NOT_FOUND: &str = "Token tidak ditemukan";
pub const MSG_NO_RECIPIENTS: &str = "Tidak ada responden dengan tautan landing page yang terdaftar.";

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("{0}")]
    NotFound(String),
    #[error("Gagal mendekripsi data")]
    Decryption,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Configuration(String),
    #[error("internal error")]
    Internal,
}

impl From<CipherError> for LinkError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::MissingKey => Self::Configuration(err.to_string()),
            CipherError::Decryption => Self::Decryption,
            CipherError::Encryption => Self::Internal,
        }
    }
}

impl From<TokenError> for LinkError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingSecret { .. } => Self::Configuration(err.to_string()),
            TokenError::Invalid => Self::NotFound(MSG_TOKEN_NOT_FOUND.to_string()),
            TokenError::Encode => Self::Internal,
        }
    }
}

impl From<StoreError> for LinkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Database(err) => {
                tracing::error!("Link store failure: {err}");
                Self::Internal
            }
        }
    }
}
