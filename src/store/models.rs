use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Role tag stored on `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Administrative principal.
/// Note: Debug is implemented by hand so the password hash never reaches logs.
#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Respondent {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Tokenized single-use link owned by a respondent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Link {
    pub id: i64,
    pub token: String,
    pub respondent_id: i64,
    pub used: bool,
    pub form_url: Option<String>,
    pub landing_url: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Link counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub total: u64,
    pub used: u64,
    pub unused: u64,
    pub with_landing_url: u64,
}

/// A link joined with the respondent it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecipient {
    pub name: String,
    pub email: String,
    pub landing_url: String,
}
