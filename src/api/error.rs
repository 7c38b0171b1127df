//! Response shaping for core failures.
//!
//! Every failure leaves the API as `{ "success": false, "message": ... }`.
//! Status codes are chosen from the error variant, never from its text.

use crate::{auth::AuthError, link::LinkError, mailer::MailerError, store::StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

pub(crate) const MSG_INTERNAL: &str = "Terjadi kesalahan pada server";
pub(crate) const MSG_MISCONFIGURED: &str = "Konfigurasi server tidak lengkap";

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

pub(crate) fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}

fn misconfigured(detail: &str) -> Response {
    error!(detail, "Service misconfigured");
    failure(StatusCode::INTERNAL_SERVER_ERROR, MSG_MISCONFIGURED)
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials(_) | Self::Locked { .. } => {
                failure(StatusCode::UNAUTHORIZED, self.to_string())
            }
            Self::Forbidden => failure(StatusCode::FORBIDDEN, self.to_string()),
            Self::Configuration(detail) => misconfigured(&detail),
            Self::Internal => failure(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL),
        }
    }
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => failure(StatusCode::NOT_FOUND, message),
            Self::Decryption => failure(StatusCode::BAD_REQUEST, self.to_string()),
            Self::Validation(message) => failure(StatusCode::BAD_REQUEST, message),
            Self::Conflict(message) => failure(StatusCode::CONFLICT, message),
            Self::Configuration(detail) => misconfigured(&detail),
            Self::Internal => failure(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            Self::Conflict(message) => failure(StatusCode::CONFLICT, message),
            Self::Database(err) => {
                error!("Database error: {err}");
                failure(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
            }
        }
    }
}

impl IntoResponse for MailerError {
    fn into_response(self) -> Response {
        match self {
            Self::EmptyBody | Self::InvalidAddress(_) => {
                failure(StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Build(_) | Self::Transport(_) => {
                error!("Mail dispatch failed: {self}");
                failure(StatusCode::BAD_GATEWAY, self.to_string())
            }
        }
    }
}
