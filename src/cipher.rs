//! Authenticated symmetric encryption for link payloads.
//!
//! Output is `nonce (12 bytes) || ciphertext`, base64 encoded and then
//! rewritten to a URL-safe alphabet (`+` to `-`, `/` to `_`, padding
//! stripped) so it can travel in a query string.

use base64ct::{Base64, Encoding};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("cipher key is not configured (set SECRET_KEY)")]
    MissingKey,
    #[error("failed to decrypt data")]
    Decryption,
    #[error("failed to encrypt data")]
    Encryption,
}

#[derive(Clone)]
pub struct LinkCipher {
    key: Option<SecretString>,
}

impl std::fmt::Debug for LinkCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCipher")
            .field("key_set", &self.key.is_some())
            .finish()
    }
}

impl LinkCipher {
    #[must_use]
    pub fn new(key: Option<SecretString>) -> Self {
        Self { key }
    }

    #[allow(deprecated)]
    fn cipher(&self) -> Result<ChaCha20Poly1305, CipherError> {
        let secret = self
            .key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(CipherError::MissingKey)?;
        let digest = Sha256::digest(secret.expose_secret().as_bytes());
        Ok(ChaCha20Poly1305::new(Key::from_slice(&digest)))
    }

    /// # Errors
    /// `MissingKey` when unconfigured, `Encryption` if the AEAD rejects the input.
    #[allow(deprecated)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut data = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        data.extend_from_slice(&nonce_bytes);
        data.extend_from_slice(&ciphertext);

        Ok(to_url_safe(&Base64::encode_string(&data)))
    }

    /// # Errors
    /// `MissingKey` when unconfigured; every other failure is `Decryption`.
    #[allow(deprecated)]
    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        let cipher = self.cipher()?;

        let data =
            Base64::decode_vec(&from_url_safe(token)).map_err(|_| CipherError::Decryption)?;
        if data.len() <= NONCE_LEN {
            return Err(CipherError::Decryption);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Decryption)
    }
}

fn to_url_safe(encoded: &str) -> String {
    encoded
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

fn from_url_safe(token: &str) -> String {
    let mut restored: String = token
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while restored.len() % 4 != 0 {
        restored.push('=');
    }
    restored
}
