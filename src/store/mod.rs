//! Storage abstractions for users, respondents and links.
//!
//! The services only talk to the traits below. `PgStore` is the production
//! backend; `MemoryStore` keeps the same semantics in process and backs the
//! test-suite.
//!
//! The single-use guarantee lives in [`LinkRepository::mark_used`]: it is a
//! conditional write (`used = false` is part of the predicate) and reports
//! whether this caller performed the transition.

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait RespondentRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Respondent>>;

    async fn count(&self) -> StoreResult<u64>;

    async fn find(&self, id: i64) -> StoreResult<Option<Respondent>>;

    /// Insert a respondent; a duplicate email is a [`StoreError::Conflict`].
    async fn create(&self, name: &str, email: &str) -> StoreResult<Respondent>;

    /// Apply the given fields, keeping the stored value for `None`.
    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<Respondent>>;

    /// Delete a respondent and its link. Returns `false` when nothing matched.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn find_unused_by_token(&self, token: &str) -> StoreResult<Option<Link>>;

    /// Flip `used` to true for an unused link, stamping the activation time and
    /// persisting the session token in the same write.
    ///
    /// Returns `true` only for the caller whose write changed the row.
    async fn mark_used(
        &self,
        token: &str,
        session_token: &str,
        activated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Insert or replace the token of the respondent's link and reset it to unused.
    async fn upsert_for_respondent(&self, respondent_id: i64, token: &str) -> StoreResult<Link>;

    /// Create a link with an explicit token and form URL.
    async fn create_link(
        &self,
        respondent_id: i64,
        form_url: &str,
        token: &str,
    ) -> StoreResult<Link>;

    async fn update_landing_url(&self, link_id: i64, landing_url: &str) -> StoreResult<()>;

    /// Point every link at the same form URL. Returns the number of rows touched.
    async fn update_form_urls(&self, form_url: &str) -> StoreResult<u64>;

    async fn list_links(&self) -> StoreResult<Vec<Link>>;

    async fn find_all_with_landing_url(&self) -> StoreResult<Vec<LinkRecipient>>;

    async fn stats(&self) -> StoreResult<LinkStats>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
