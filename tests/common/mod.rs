//! Shared harness for the router-level tests.
//!
//! The router is wired exactly as in production but on top of `MemoryStore`
//! and a mailer that records instead of sending.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tautan::{
    api::{self, AppServices, Settings},
    auth::AuthConfig,
    link::LinkConfig,
    mailer::{Mailer, MailerError, OutgoingMail, SendReceipt},
    store::{MemoryStore, Role},
};
use tower::ServiceExt;

pub const SECRET: &str = "integration-shared-secret";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password123";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, MailerError> {
        if mail.to.starts_with("bounce") {
            return Err(MailerError::Transport("mailbox unavailable".to_string()));
        }
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(mail.clone());
        Ok(SendReceipt {
            message_id: format!("<{}@test>", sent.len()),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn settings() -> Settings {
    Settings {
        auth: AuthConfig::new().with_secret_key(Some(SecretString::from(SECRET.to_string()))),
        links: LinkConfig::new().with_secret_key(Some(SecretString::from(SECRET.to_string()))),
        smtp: None,
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(&settings())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());

        // Low cost keeps the suite fast; verification reads the cost from the hash.
        let hash = bcrypt::hash(ADMIN_PASSWORD, 4).unwrap();
        store.insert_user(ADMIN_USERNAME, Some("admin@example.com"), &hash, Role::Admin);
        let hash = bcrypt::hash("userpass123", 4).unwrap();
        store.insert_user("surveyor", None, &hash, Role::User);

        let services = AppServices::new(store.clone(), mailer.clone(), settings);
        Self {
            router: api::router(services),
            store,
            mailer,
        }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }

    pub async fn login(&self) -> Result<String> {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/admin/login",
                None,
                Some(serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {body}");
        body["data"]["accessToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing accessToken in {body}"))
    }
}
