//! Administrative authentication.
//!
//! [`AdminAuthService`] owns the credential flow and the session codec; the
//! lockout state is injected through [`AttemptTracker`] so the in-memory
//! tracker can be replaced by a shared one.

pub mod audit;
pub mod config;
pub mod error;
pub mod lockout;
pub mod password;
pub mod service;

pub use audit::{ClientInfo, LoginEvent};
pub use config::AuthConfig;
pub use error::{AuthError, CredentialFailure};
pub use lockout::{AttemptTracker, Locked, LockoutPolicy, LoginAttemptTracker};
pub use service::{AdminAuthService, AdminClaims, IssuedToken, LoginOutcome};
