//! # Tautan
//!
//! `tautan` hands out single-use survey links and guards the admin surface
//! that manages them.
//!
//! ## Links
//!
//! Every respondent owns one link. Its token is the respondent's
//! `name,email` sealed with the shared key (ChaCha20-Poly1305, URL-safe
//! base64). The first visit with a raw token flips the link to used in a
//! single conditional write and returns the form URL together with a signed
//! session token. Later visits present that session token instead; the raw
//! token is spent.
//!
//! ## Admin sessions
//!
//! Admins log in with username and password (bcrypt). Failed attempts are
//! counted per username in memory; five failures inside fifteen minutes lock
//! the account until the window passes. A successful login returns an HS256
//! session token carrying `{userId, username, role}`.
//!
//! ## Secrets
//!
//! | purpose | primary | fallback |
//! |---|---|---|
//! | admin sessions | `TAUTAN_JWT_SECRET_ADMIN` | `TAUTAN_SECRET_KEY` |
//! | link sessions | `TAUTAN_JWT_SECRET` | `TAUTAN_SECRET_KEY` |
//! | link cipher | `TAUTAN_SECRET_KEY` | none |
//!
//! A missing secret is reported as a configuration error, never as an
//! authentication failure.

pub mod api;
pub mod auth;
pub mod cipher;
pub mod cli;
pub mod link;
pub mod mailer;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
