//! Admin authentication endpoints under `/auth/admin`.

use super::{guard::AdminSession, Envelope};
use crate::{
    api::error::failure,
    auth::{AdminAuthService, AdminClaims, ClientInfo},
    store::{Role, User},
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// First failing rule, if any.
    fn validate(&self) -> Option<&'static str> {
        let username = self.username.chars().count();
        let password = self.password.chars().count();
        if username == 0 {
            Some("Username harus diisi")
        } else if username < USERNAME_MIN {
            Some("Username minimal 3 karakter")
        } else if username > USERNAME_MAX {
            Some("Username maksimal 50 karakter")
        } else if password == 0 {
            Some("Password harus diisi")
        } else if password < PASSWORD_MIN {
            Some("Password minimal 6 karakter")
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AdminProfile {
    fn summary(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: None,
            updated_at: None,
        }
    }

    fn full(user: &User) -> Self {
        Self {
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
            ..Self::summary(user)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub expires_in: u64,
    pub user: AdminProfile,
}

#[utoipa::path(
    post,
    path = "/auth/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded.", body = LoginData),
        (status = 400, description = "Invalid input.", body = crate::api::error::ErrorBody),
        (status = 401, description = "Invalid credentials or account locked.", body = crate::api::error::ErrorBody),
        (status = 403, description = "User is not an admin.", body = crate::api::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    auth: Extension<Arc<AdminAuthService>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Some(message) = request.validate() {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    let client = ClientInfo::from_headers(&headers);
    match auth.login(&request.username, &request.password, &client).await {
        Ok(outcome) => {
            let data = LoginData {
                access_token: outcome.session.token,
                expires_in: outcome.session.expires_in,
                user: AdminProfile::summary(&outcome.user),
            };
            (StatusCode::OK, Json(Envelope::ok("Login berhasil", data))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/auth/admin/verify",
    responses(
        (status = 200, description = "Token is valid.", body = AdminClaims),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
        (status = 403, description = "Token does not carry the admin role.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn verify(session: AdminSession) -> impl IntoResponse {
    Json(Envelope::ok("Token valid", session.claims))
}

#[utoipa::path(
    get,
    path = "/auth/admin/profile",
    responses(
        (status = 200, description = "Profile of the signed-in admin.", body = AdminProfile),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
        (status = 404, description = "Admin no longer exists.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    session: AdminSession,
    auth: Extension<Arc<AdminAuthService>>,
) -> impl IntoResponse {
    match auth.find_admin(&session.claims.username).await {
        Ok(Some(user)) => Json(Envelope::ok(
            "Profil admin berhasil diambil",
            AdminProfile::full(&user),
        ))
        .into_response(),
        Ok(None) => failure(StatusCode::NOT_FOUND, "Admin tidak ditemukan"),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/auth/admin/logout",
    responses(
        (status = 200, description = "Stateless logout acknowledgement."),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(_session: AdminSession) -> impl IntoResponse {
    Json(Envelope::message(
        "Logout berhasil. Hapus token dari localStorage/cookie Anda.",
    ))
}
