//! In-process store with the same semantics as the Postgres backend.

use super::{
    HealthCheck, Link, LinkRecipient, LinkRepository, LinkStats, Respondent, RespondentRepository, Role,
    StoreError, StoreResult, User, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    respondents: BTreeMap<i64, Respondent>,
    links: BTreeMap<i64, Link>,
    next_user_id: i64,
    next_respondent_id: i64,
    next_link_id: i64,
}

impl Tables {
    fn link_by_token_mut(&mut self, token: &str) -> Option<&mut Link> {
        self.links.values_mut().find(|link| link.token == token)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.respondents
            .values()
            .any(|r| r.email == email && Some(r.id) != except)
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user row, returning its id.
    pub fn insert_user(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> i64 {
        let mut tables = self.lock();
        let id = next_id(&mut tables.next_user_id);
        let now = Utc::now();
        tables.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                email: email.map(str::to_string),
                password_hash: password_hash.to_string(),
                role,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl RespondentRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Respondent>> {
        Ok(self.lock().respondents.values().cloned().collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.lock().respondents.len() as u64)
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Respondent>> {
        Ok(self.lock().respondents.get(&id).cloned())
    }

    async fn create(&self, name: &str, email: &str) -> StoreResult<Respondent> {
        let mut tables = self.lock();
        if tables.email_taken(email, None) {
            return Err(StoreError::Conflict(
                "a respondent with this email already exists".to_string(),
            ));
        }
        let id = next_id(&mut tables.next_respondent_id);
        let respondent = Respondent {
            id,
            name: name.to_string(),
            email: email.to_string(),
        };
        tables.respondents.insert(id, respondent.clone());
        Ok(respondent)
    }

    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<Respondent>> {
        let mut tables = self.lock();
        if let Some(email) = email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(
                    "a respondent with this email already exists".to_string(),
                ));
            }
        }
        let Some(respondent) = tables.respondents.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            respondent.name = name.to_string();
        }
        if let Some(email) = email {
            respondent.email = email.to_string();
        }
        Ok(Some(respondent.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        if tables.respondents.remove(&id).is_none() {
            return Ok(false);
        }
        tables.links.retain(|_, link| link.respondent_id != id);
        Ok(true)
    }
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn find_unused_by_token(&self, token: &str) -> StoreResult<Option<Link>> {
        Ok(self
            .lock()
            .links
            .values()
            .find(|link| link.token == token && !link.used)
            .cloned())
    }

    async fn mark_used(
        &self,
        token: &str,
        session_token: &str,
        activated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.lock();
        match tables.link_by_token_mut(token) {
            Some(link) if !link.used => {
                link.used = true;
                link.activated_at = Some(activated_at);
                link.session_token = Some(session_token.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_for_respondent(&self, respondent_id: i64, token: &str) -> StoreResult<Link> {
        let mut tables = self.lock();
        if let Some(link) = tables
            .links
            .values_mut()
            .find(|link| link.respondent_id == respondent_id)
        {
            link.token = token.to_string();
            link.used = false;
            link.activated_at = None;
            link.session_token = None;
            return Ok(link.clone());
        }
        let id = next_id(&mut tables.next_link_id);
        let link = Link {
            id,
            token: token.to_string(),
            respondent_id,
            used: false,
            form_url: None,
            landing_url: None,
            session_token: None,
            activated_at: None,
        };
        tables.links.insert(id, link.clone());
        Ok(link)
    }

    async fn create_link(
        &self,
        respondent_id: i64,
        form_url: &str,
        token: &str,
    ) -> StoreResult<Link> {
        let mut tables = self.lock();
        if tables
            .links
            .values()
            .any(|link| link.respondent_id == respondent_id || link.token == token)
        {
            return Err(StoreError::Conflict(
                "the respondent already has a link or the token is taken".to_string(),
            ));
        }
        let id = next_id(&mut tables.next_link_id);
        let link = Link {
            id,
            token: token.to_string(),
            respondent_id,
            used: false,
            form_url: Some(form_url.to_string()),
            landing_url: None,
            session_token: None,
            activated_at: None,
        };
        tables.links.insert(id, link.clone());
        Ok(link)
    }

    async fn update_landing_url(&self, link_id: i64, landing_url: &str) -> StoreResult<()> {
        if let Some(link) = self.lock().links.get_mut(&link_id) {
            link.landing_url = Some(landing_url.to_string());
        }
        Ok(())
    }

    async fn update_form_urls(&self, form_url: &str) -> StoreResult<u64> {
        let mut tables = self.lock();
        let mut touched = 0;
        for link in tables.links.values_mut() {
            link.form_url = Some(form_url.to_string());
            touched += 1;
        }
        Ok(touched)
    }

    async fn list_links(&self) -> StoreResult<Vec<Link>> {
        Ok(self.lock().links.values().cloned().collect())
    }

    async fn find_all_with_landing_url(&self) -> StoreResult<Vec<LinkRecipient>> {
        let tables = self.lock();
        Ok(tables
            .links
            .values()
            .filter_map(|link| {
                let landing_url = link.landing_url.clone()?;
                let respondent = tables.respondents.get(&link.respondent_id)?;
                Some(LinkRecipient {
                    name: respondent.name.clone(),
                    email: respondent.email.clone(),
                    landing_url,
                })
            })
            .collect())
    }

    async fn stats(&self) -> StoreResult<LinkStats> {
        let tables = self.lock();
        let mut stats = LinkStats::default();
        for link in tables.links.values() {
            stats.total += 1;
            if link.used {
                stats.used += 1;
            } else {
                stats.unused += 1;
            }
            if link.landing_url.is_some() {
                stats.with_landing_url += 1;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
