//! Link endpoints under `/api/link`.
//!
//! `get-form` is the only public route: a respondent either presents the raw
//! token from the landing URL or the session token handed out on first use.
//! Everything else is administration and requires an admin session.

use super::{
    guard::{extract_bearer, AdminSession},
    Envelope,
};
use crate::{
    link::{BulkInvitation, LinkService},
    mailer::DispatchResult,
    store::Link,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GetFormRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GetFormResponse {
    pub success: bool,
    #[serde(rename = "tautanForm")]
    pub form_url: String,
    /// Session token, only on the first visit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub id_responden: i64,
    pub tautan_form: String,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DataRequest {
    pub data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse {
    pub result: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BaseLinkRequest {
    pub link: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountData {
    pub count: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendRespondentBulkRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html_template: Option<String>,
    #[serde(default)]
    pub text_template: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkReportResponse {
    pub success: bool,
    pub message: String,
    pub total: usize,
    pub sent: usize,
    pub results: Vec<DispatchResult>,
}

#[utoipa::path(
    post,
    path = "/api/link/get-form",
    request_body = GetFormRequest,
    responses(
        (status = 200, description = "Form URL, plus a session token on first use.", body = GetFormResponse),
        (status = 404, description = "Unknown, spent or unconfigured link.", body = crate::api::error::ErrorBody),
    ),
    tag = "link"
)]
pub async fn get_form(
    headers: HeaderMap,
    links: Extension<Arc<LinkService>>,
    request: Option<Json<GetFormRequest>>,
) -> impl IntoResponse {
    let raw = request.and_then(|Json(body)| body.token);
    let session = extract_bearer(&headers).ok();

    match links.consume(raw.as_deref(), session).await {
        Ok(consumed) => Json(GetFormResponse {
            success: true,
            form_url: consumed.form_url,
            token: consumed.session_token,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/tautan",
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Link created.", body = Link),
        (status = 400, description = "Invalid input or unknown respondent.", body = crate::api::error::ErrorBody),
        (status = 409, description = "Respondent already has a link.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn create_link(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<CreateLinkRequest>,
) -> impl IntoResponse {
    match links
        .create_link(request.id_responden, &request.tautan_form, &request.token)
        .await
    {
        Ok(link) => (
            StatusCode::CREATED,
            Json(Envelope::ok("Tautan berhasil dibuat", link)),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/generate-token",
    responses(
        (status = 200, description = "Tokens regenerated for every respondent.", body = CountData),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn generate_token(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
) -> impl IntoResponse {
    match links.generate_tokens_for_all_respondents().await {
        Ok(count) => Json(Envelope::ok(
            "token berhasil digenerate",
            CountData {
                count: count as u64,
            },
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/encrypt",
    request_body = DataRequest,
    responses(
        (status = 200, description = "URL-safe ciphertext.", body = DataResponse),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn encrypt(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<DataRequest>,
) -> impl IntoResponse {
    match links.encrypt(&request.data) {
        Ok(result) => Json(DataResponse { result }).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/decrypt",
    request_body = DataRequest,
    responses(
        (status = 200, description = "Recovered plaintext.", body = DataResponse),
        (status = 400, description = "Malformed or foreign ciphertext.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn decrypt(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<DataRequest>,
) -> impl IntoResponse {
    match links.decrypt(&request.data) {
        Ok(result) => Json(DataResponse { result }).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/set-landingPage-link",
    request_body = BaseLinkRequest,
    responses(
        (status = 200, description = "Tokens regenerated and landing URLs written.", body = CountData),
        (status = 400, description = "Malformed base URL.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn set_landing_page_link(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<BaseLinkRequest>,
) -> impl IntoResponse {
    match links.set_landing_page_link(&request.link).await {
        Ok(count) => Json(Envelope::ok(
            "Berhasil generate token dan membuat tautan landing page",
            CountData {
                count: count as u64,
            },
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/set-formPage-link",
    request_body = BaseLinkRequest,
    responses(
        (status = 200, description = "Form URL written to every link.", body = CountData),
        (status = 400, description = "Malformed URL.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn set_form_page_link(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<BaseLinkRequest>,
) -> impl IntoResponse {
    match links.set_form_link(&request.link).await {
        Ok(count) => {
            Json(Envelope::ok("berhasil membuat tautan form", CountData { count })).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/link/send-bulk",
    request_body = SendRespondentBulkRequest,
    responses(
        (status = 200, description = "Per-recipient dispatch report.", body = BulkReportResponse),
        (status = 400, description = "Missing subject or template.", body = crate::api::error::ErrorBody),
        (status = 404, description = "No link has a landing URL yet.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "link"
)]
pub async fn send_bulk(
    _session: AdminSession,
    links: Extension<Arc<LinkService>>,
    Json(request): Json<SendRespondentBulkRequest>,
) -> impl IntoResponse {
    let invitation = BulkInvitation {
        subject: request.subject,
        html_template: request.html_template,
        text_template: request.text_template,
    };
    match links.send_bulk_invitations(&invitation).await {
        Ok(report) => Json(BulkReportResponse {
            success: true,
            message: report.message,
            total: report.total,
            sent: report.sent,
            results: report.results,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}
