//! Direct mail endpoints under `/api/email`.

use super::{guard::AdminSession, valid_email};
use crate::{
    api::error::failure,
    mailer::{dispatch_sequential, DispatchResult, Mailer, OutgoingMail},
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendBulkRequest {
    #[serde(default)]
    pub emails: Vec<OutgoingMail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendBulkResponse {
    pub success: bool,
    pub results: Vec<DispatchResult>,
}

fn validate(mail: &OutgoingMail) -> Result<(), String> {
    if !valid_email(&mail.to) {
        return Err(format!("Alamat email tidak valid: {}", mail.to));
    }
    if mail.subject.trim().is_empty() {
        return Err("Subjek tidak boleh kosong".to_string());
    }
    mail.ensure_body().map_err(|err| err.to_string())
}

#[utoipa::path(
    post,
    path = "/api/email/send",
    request_body = OutgoingMail,
    responses(
        (status = 200, description = "Message accepted by the transport.", body = SendResponse),
        (status = 400, description = "Invalid recipient, subject or body.", body = crate::api::error::ErrorBody),
        (status = 502, description = "Transport failure.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "email"
)]
pub async fn send(
    _session: AdminSession,
    mailer: Extension<Arc<dyn Mailer>>,
    Json(mail): Json<OutgoingMail>,
) -> Response {
    if let Err(message) = validate(&mail) {
        return failure(StatusCode::BAD_REQUEST, message);
    }
    match mailer.send(&mail).await {
        Ok(receipt) => Json(SendResponse {
            success: true,
            message_id: receipt.message_id,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/email/send-bulk",
    request_body = SendBulkRequest,
    responses(
        (status = 200, description = "Per-message results; invalid entries are reported, not sent.", body = SendBulkResponse),
    ),
    security(("bearer" = [])),
    tag = "email"
)]
pub async fn send_bulk(
    _session: AdminSession,
    mailer: Extension<Arc<dyn Mailer>>,
    Json(request): Json<SendBulkRequest>,
) -> Response {
    let mut rejected = Vec::new();
    let mut accepted = Vec::new();
    for mail in request.emails {
        match validate(&mail) {
            Ok(()) => accepted.push(mail),
            Err(message) => rejected.push(DispatchResult {
                to: mail.to,
                success: false,
                message_id: None,
                error: Some(message),
            }),
        }
    }

    let mut results = dispatch_sequential(mailer.0.as_ref(), &accepted).await;
    results.extend(rejected);

    Json(SendBulkResponse {
        success: true,
        results,
    })
    .into_response()
}
