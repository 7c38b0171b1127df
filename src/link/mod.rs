//! Respondent survey links ("tautan").
//!
//! A link moves from unused to used exactly once. After that the respondent
//! reaches the form through the session token handed out on first use.

pub mod config;
pub mod error;
pub mod service;
pub mod template;

pub use config::LinkConfig;
pub use error::LinkError;
pub use service::{BulkInvitation, BulkReport, Consumed, LinkClaims, LinkService};
