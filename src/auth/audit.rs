//! Login audit trail.
//!
//! Every admin login attempt produces exactly one event on the
//! `tautan::audit` target so operators can route it separately
//! (`RUST_LOG=tautan::audit=info`). The most recent attempts are also kept
//! in memory for the dashboard activity log.

use axum::http::{header::USER_AGENT, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};
use utoipa::ToSchema;

const TRAIL_CAPACITY: usize = 100;

/// Request metadata recorded next to a login attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip: extract_client_ip(headers),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Extract a client IP from common proxy headers.
#[must_use]
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn login_succeeded(username: &str, user_id: i64, client: &ClientInfo) {
    info!(
        target: "tautan::audit",
        username,
        user_id,
        outcome = "success",
        ip = client.ip.as_deref().unwrap_or("unknown"),
        user_agent = client.user_agent.as_deref().unwrap_or("unknown"),
        "admin login"
    );
}

pub fn login_failed(username: &str, user_id: Option<i64>, reason: &str, client: &ClientInfo) {
    warn!(
        target: "tautan::audit",
        username,
        user_id = user_id.unwrap_or(0),
        outcome = "failure",
        reason,
        ip = client.ip.as_deref().unwrap_or("unknown"),
        user_agent = client.user_agent.as_deref().unwrap_or("unknown"),
        "admin login"
    );
}

/// One login attempt as shown in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoginEvent {
    pub id: u64,
    /// `LOGIN` or `LOGIN_FAILED`.
    pub action: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct TrailState {
    next_id: u64,
    events: VecDeque<LoginEvent>,
}

/// Bounded in-memory history of login attempts; the oldest entry is evicted
/// once the capacity is reached.
#[derive(Debug)]
pub struct AuditTrail {
    capacity: usize,
    state: Mutex<TrailState>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::with_capacity(TRAIL_CAPACITY)
    }
}

impl AuditTrail {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(TrailState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, action: &'static str, user: &str, reason: Option<&'static str>, client: &ClientInfo) {
        let mut state = self.lock();
        state.next_id += 1;
        let event = LoginEvent {
            id: state.next_id,
            action: action.to_string(),
            user: user.to_string(),
            timestamp: Utc::now(),
            ip: client.ip.clone(),
            reason: reason.map(str::to_string),
        };
        if state.events.len() == self.capacity {
            state.events.pop_front();
        }
        state.events.push_back(event);
    }

    pub fn record_success(&self, username: &str, user_id: i64, client: &ClientInfo) {
        login_succeeded(username, user_id, client);
        self.push("LOGIN", username, None, client);
    }

    pub fn record_failure(
        &self,
        username: &str,
        user_id: Option<i64>,
        reason: &'static str,
        client: &ClientInfo,
    ) {
        login_failed(username, user_id, reason, client);
        self.push("LOGIN_FAILED", username, Some(reason), client);
    }

    /// Up to `limit` events, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<LoginEvent> {
        self.lock().events.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn client(ip: &str) -> ClientInfo {
        ClientInfo {
            ip: Some(ip.to_string()),
            user_agent: None,
        }
    }

    #[test]
    fn trail_lists_newest_first() {
        let trail = AuditTrail::default();
        trail.record_failure("admin", None, "wrong_password", &client("10.0.0.1"));
        trail.record_success("admin", 1, &client("10.0.0.2"));

        let events = trail.recent(10);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, "LOGIN");
        assert_eq!(events[0].id, 2);
        assert_eq!(events[0].ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(events[1].action, "LOGIN_FAILED");
        assert_eq!(events[1].reason.as_deref(), Some("wrong_password"));
        assert_eq!(trail.recent(1).len(), 1);
    }

    #[test]
    fn trail_evicts_oldest_at_capacity() {
        let trail = AuditTrail::with_capacity(3);
        for user in ["a", "b", "c", "d"] {
            trail.record_success(user, 1, &ClientInfo::default());
        }
        let users: Vec<_> = trail.recent(10).into_iter().map(|e| e.user).collect();
        assert_eq!(users, ["d", "c", "b"]);
    }

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_is_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 198.51.100.2 "));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("198.51.100.2"));
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn client_info_reads_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let client = ClientInfo::from_headers(&headers);
        assert_eq!(client.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(client.ip, None);
    }
}
