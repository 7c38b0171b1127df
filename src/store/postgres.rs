//! Postgres-backed repositories.

use super::{
    is_unique_violation, HealthCheck, Link, LinkRecipient, LinkRepository, LinkStats, Respondent,
    RespondentRepository, Role, StoreError, StoreResult, User, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{info_span, Instrument};

const LINK_COLUMNS: &str =
    "id, token, respondent_id, used, form_url, landing_url, session_token, activated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_span(operation: &'static str) -> tracing::Span {
    info_span!("db.query", db.system = "postgresql", db.operation = operation)
}

fn link_from_row(row: &PgRow) -> Link {
    Link {
        id: row.get("id"),
        token: row.get("token"),
        respondent_id: row.get("respondent_id"),
        used: row.get("used"),
        form_url: row.get("form_url"),
        landing_url: row.get("landing_url"),
        session_token: row.get("session_token"),
        activated_at: row.get("activated_at"),
    }
}

fn count_column(row: &PgRow, column: &str) -> u64 {
    u64::try_from(row.get::<i64, _>(column)).unwrap_or(0)
}

fn respondent_from_row(row: &PgRow) -> Respondent {
    Respondent {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
    }
}

fn email_conflict(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict("a respondent with this email already exists".to_string())
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let query = r"
            SELECT id, username, email, password, role, created_at, updated_at
            FROM users
            WHERE username = $1
        ";
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;

        Ok(row.map(|row| {
            let role: String = row.get("role");
            User {
                id: row.get("id"),
                username: row.get("username"),
                email: row.get("email"),
                password_hash: row.get("password"),
                // The CHECK constraint only admits the two known roles.
                role: role.parse().unwrap_or(Role::User),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }
        }))
    }
}

#[async_trait]
impl RespondentRepository for PgStore {
    async fn list(&self) -> StoreResult<Vec<Respondent>> {
        let rows = sqlx::query("SELECT id, name, email FROM respondents ORDER BY id ASC")
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(rows.iter().map(respondent_from_row).collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM respondents")
            .fetch_one(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(count_column(&row, "total"))
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Respondent>> {
        let row = sqlx::query("SELECT id, name, email FROM respondents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(row.as_ref().map(respondent_from_row))
    }

    async fn create(&self, name: &str, email: &str) -> StoreResult<Respondent> {
        let query = "INSERT INTO respondents (name, email) VALUES ($1, $2) RETURNING id, name, email";
        let row = sqlx::query(query)
            .bind(name)
            .bind(email)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT"))
            .await
            .map_err(email_conflict)?;
        Ok(respondent_from_row(&row))
    }

    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<Respondent>> {
        let query = r"
            UPDATE respondents
            SET name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, name, email
        ";
        let row = sqlx::query(query)
            .bind(id)
            .bind(name)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE"))
            .await
            .map_err(email_conflict)?;
        Ok(row.as_ref().map(respondent_from_row))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        // links.respondent_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM respondents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE"))
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LinkRepository for PgStore {
    async fn find_unused_by_token(&self, token: &str) -> StoreResult<Option<Link>> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links WHERE token = $1 AND used = FALSE");
        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(row.as_ref().map(link_from_row))
    }

    async fn mark_used(
        &self,
        token: &str,
        session_token: &str,
        activated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let query = r"
            UPDATE links
            SET used = TRUE,
                activated_at = $2,
                session_token = $3
            WHERE token = $1 AND used = FALSE
        ";
        let result = sqlx::query(query)
            .bind(token)
            .bind(activated_at)
            .bind(session_token)
            .execute(&self.pool)
            .instrument(db_span("UPDATE"))
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert_for_respondent(&self, respondent_id: i64, token: &str) -> StoreResult<Link> {
        let query = format!(
            r"
            INSERT INTO links (respondent_id, token, used)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (respondent_id)
            DO UPDATE SET token = EXCLUDED.token, used = FALSE, activated_at = NULL, session_token = NULL
            RETURNING {LINK_COLUMNS}
        "
        );
        let row = sqlx::query(&query)
            .bind(respondent_id)
            .bind(token)
            .fetch_one(&self.pool)
            .instrument(db_span("UPSERT"))
            .await?;
        Ok(link_from_row(&row))
    }

    async fn create_link(
        &self,
        respondent_id: i64,
        form_url: &str,
        token: &str,
    ) -> StoreResult<Link> {
        let query = format!(
            r"
            INSERT INTO links (respondent_id, form_url, token, used)
            VALUES ($1, $2, $3, FALSE)
            RETURNING {LINK_COLUMNS}
        "
        );
        let row = sqlx::query(&query)
            .bind(respondent_id)
            .bind(form_url)
            .bind(token)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT"))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Conflict(
                        "the respondent already has a link or the token is taken".to_string(),
                    )
                } else {
                    StoreError::Database(err)
                }
            })?;
        Ok(link_from_row(&row))
    }

    async fn update_landing_url(&self, link_id: i64, landing_url: &str) -> StoreResult<()> {
        sqlx::query("UPDATE links SET landing_url = $2 WHERE id = $1")
            .bind(link_id)
            .bind(landing_url)
            .execute(&self.pool)
            .instrument(db_span("UPDATE"))
            .await?;
        Ok(())
    }

    async fn update_form_urls(&self, form_url: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE links SET form_url = $1")
            .bind(form_url)
            .execute(&self.pool)
            .instrument(db_span("UPDATE"))
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_links(&self) -> StoreResult<Vec<Link>> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(rows.iter().map(link_from_row).collect())
    }

    async fn find_all_with_landing_url(&self) -> StoreResult<Vec<LinkRecipient>> {
        let query = r"
            SELECT r.name, r.email, l.landing_url
            FROM links l
            JOIN respondents r ON r.id = l.respondent_id
            WHERE l.landing_url IS NOT NULL
            ORDER BY l.id ASC
        ";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(rows
            .iter()
            .map(|row| LinkRecipient {
                name: row.get("name"),
                email: row.get("email"),
                landing_url: row.get("landing_url"),
            })
            .collect())
    }

    async fn stats(&self) -> StoreResult<LinkStats> {
        let query = r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE used) AS used,
                COUNT(*) FILTER (WHERE landing_url IS NOT NULL) AS with_landing_url
            FROM links
        ";
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        let total = count_column(&row, "total");
        let used = count_column(&row, "used");
        Ok(LinkStats {
            total,
            used,
            unused: total.saturating_sub(used),
            with_landing_url: count_column(&row, "with_landing_url"),
        })
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await?;
        conn.ping()
            .instrument(info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await?;
        Ok(())
    }
}
