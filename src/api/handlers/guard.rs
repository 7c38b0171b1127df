//! Admin guard.
//!
//! Flow Overview: read `Authorization: Bearer <token>`, verify it with the
//! admin session codec, then require the `admin` role. Handlers that take an
//! [`AdminSession`] argument are guarded; the rejection is answered before
//! the handler body runs.

use crate::{
    api::error::failure,
    auth::{AdminAuthService, AdminClaims},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

pub const MSG_TOKEN_MISSING: &str = "Token tidak ditemukan";
pub const MSG_TOKEN_INVALID: &str = "Token tidak valid atau kadaluarsa";
pub const MSG_HEADER_MALFORMED: &str =
    "Format Authorization header tidak valid (gunakan: Bearer <token>)";
pub const MSG_ADMIN_ONLY: &str = "Hanya admin yang dapat mengakses resource ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    MissingToken,
    MalformedHeader,
    InvalidToken,
    NotAdmin,
    Unavailable,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => failure(StatusCode::UNAUTHORIZED, MSG_TOKEN_MISSING),
            Self::MalformedHeader => failure(StatusCode::UNAUTHORIZED, MSG_HEADER_MALFORMED),
            Self::InvalidToken => failure(StatusCode::UNAUTHORIZED, MSG_TOKEN_INVALID),
            Self::NotAdmin => failure(StatusCode::FORBIDDEN, MSG_ADMIN_ONLY),
            Self::Unavailable => {
                error!("Admin auth service missing from request extensions");
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    crate::api::error::MSG_INTERNAL,
                )
            }
        }
    }
}

/// Pull the bearer token out of the headers.
///
/// # Errors
/// `MissingToken` without the header, `MalformedHeader` unless the value is
/// exactly `Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, GuardRejection> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(GuardRejection::MissingToken);
    };
    let value = value.to_str().map_err(|_| GuardRejection::MalformedHeader)?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(GuardRejection::MalformedHeader),
    }
}

/// Verified admin claims for the current request.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: AdminClaims,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<AdminAuthService>>()
            .cloned()
            .ok_or(GuardRejection::Unavailable)?;

        let token = extract_bearer(&parts.headers)?;

        let claims = auth
            .verify_session_token(token)
            .ok_or(GuardRejection::InvalidToken)?;

        if !claims.is_admin() {
            debug!(username = %claims.username, "Rejected non-admin session");
            return Err(GuardRejection::NotAdmin);
        }

        Ok(Self {
            claims,
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_missing_token() {
        assert_eq!(
            extract_bearer(&HeaderMap::new()),
            Err(GuardRejection::MissingToken)
        );
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn other_shapes_are_malformed() {
        for value in ["Basic abc", "Bearer", "Bearer ", "bearer abc", "Bearer a b", "abc"] {
            assert_eq!(
                extract_bearer(&headers(value)),
                Err(GuardRejection::MalformedHeader),
                "{value}"
            );
        }
    }

    #[test]
    fn rejections_map_to_statuses() {
        assert_eq!(
            GuardRejection::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GuardRejection::NotAdmin.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
