//! Respondent CRUD under `/responden`.
//!
//! Deleting a respondent also removes its link. Emails are unique; a
//! duplicate is reported as 409.

use super::{guard::AdminSession, valid_email, Envelope};
use crate::{
    api::error::failure,
    store::{Link, LinkRepository, Respondent, RespondentRepository, StoreError},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const MSG_DUPLICATE_EMAIL: &str = "Responden dengan email ini sudah ada";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRespondentRequest {
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRespondentRequest {
    pub nama: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RespondentView {
    pub id: i64,
    pub nama: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tautan: Option<Link>,
}

impl RespondentView {
    fn new(respondent: Respondent, link: Option<Link>) -> Self {
        Self {
            id: respondent.id,
            nama: respondent.name,
            email: respondent.email,
            tautan: link,
        }
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        Err("Nama tidak boleh kosong")
    } else {
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() {
        Err("Email tidak boleh kosong")
    } else if !valid_email(email.trim()) {
        Err("Format email tidak valid")
    } else {
        Ok(())
    }
}

fn not_found(id: i64) -> Response {
    failure(
        StatusCode::NOT_FOUND,
        format!("Responden dengan ID {id} tidak ditemukan"),
    )
}

fn store_failure(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(_) => failure(StatusCode::CONFLICT, MSG_DUPLICATE_EMAIL),
        other @ StoreError::Database(_) => other.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/responden",
    responses(
        (status = 200, description = "Every respondent with its link, ordered by id.", body = [RespondentView]),
    ),
    security(("bearer" = [])),
    tag = "responden"
)]
pub async fn list(
    _session: AdminSession,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    links: Extension<Arc<dyn LinkRepository>>,
) -> Response {
    let respondents = match respondents.list().await {
        Ok(respondents) => respondents,
        Err(err) => return store_failure(err),
    };
    let mut links = match links.list_links().await {
        Ok(links) => links,
        Err(err) => return store_failure(err),
    };

    let views: Vec<RespondentView> = respondents
        .into_iter()
        .map(|respondent| {
            let link = links
                .iter()
                .position(|link| link.respondent_id == respondent.id)
                .map(|index| links.swap_remove(index));
            RespondentView::new(respondent, link)
        })
        .collect();

    Json(views).into_response()
}

#[utoipa::path(
    post,
    path = "/responden",
    request_body = CreateRespondentRequest,
    responses(
        (status = 201, description = "Respondent created.", body = RespondentView),
        (status = 400, description = "Invalid name or email.", body = crate::api::error::ErrorBody),
        (status = 409, description = "Email already registered.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "responden"
)]
pub async fn create(
    _session: AdminSession,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    Json(request): Json<CreateRespondentRequest>,
) -> Response {
    if let Err(message) = validate_name(&request.nama).and(validate_email(&request.email)) {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match respondents
        .create(request.nama.trim(), request.email.trim())
        .await
    {
        Ok(respondent) => (
            StatusCode::CREATED,
            Json(Envelope::ok(
                "Responden berhasil dibuat",
                RespondentView::new(respondent, None),
            )),
        )
            .into_response(),
        Err(err) => store_failure(err),
    }
}

#[utoipa::path(
    get,
    path = "/responden/{id}",
    params(("id" = i64, Path, description = "Respondent id")),
    responses(
        (status = 200, description = "Respondent with its link.", body = RespondentView),
        (status = 404, description = "Unknown respondent.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "responden"
)]
pub async fn find(
    _session: AdminSession,
    Path(id): Path<i64>,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    links: Extension<Arc<dyn LinkRepository>>,
) -> Response {
    let respondent = match respondents.find(id).await {
        Ok(Some(respondent)) => respondent,
        Ok(None) => return not_found(id),
        Err(err) => return store_failure(err),
    };
    let link = match links.list_links().await {
        Ok(links) => links.into_iter().find(|link| link.respondent_id == id),
        Err(err) => return store_failure(err),
    };
    Json(RespondentView::new(respondent, link)).into_response()
}

#[utoipa::path(
    patch,
    path = "/responden/{id}",
    params(("id" = i64, Path, description = "Respondent id")),
    request_body = UpdateRespondentRequest,
    responses(
        (status = 200, description = "Respondent updated.", body = RespondentView),
        (status = 400, description = "Invalid name or email.", body = crate::api::error::ErrorBody),
        (status = 404, description = "Unknown respondent.", body = crate::api::error::ErrorBody),
        (status = 409, description = "Email already registered.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "responden"
)]
pub async fn update(
    _session: AdminSession,
    Path(id): Path<i64>,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    Json(request): Json<UpdateRespondentRequest>,
) -> Response {
    let checks = request
        .nama
        .as_deref()
        .map_or(Ok(()), validate_name)
        .and(request.email.as_deref().map_or(Ok(()), validate_email));
    if let Err(message) = checks {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match respondents
        .update(
            id,
            request.nama.as_deref().map(str::trim),
            request.email.as_deref().map(str::trim),
        )
        .await
    {
        Ok(Some(respondent)) => Json(Envelope::ok(
            "Responden berhasil diperbarui",
            RespondentView::new(respondent, None),
        ))
        .into_response(),
        Ok(None) => not_found(id),
        Err(err) => store_failure(err),
    }
}

#[utoipa::path(
    delete,
    path = "/responden/{id}",
    params(("id" = i64, Path, description = "Respondent id")),
    responses(
        (status = 200, description = "Respondent and its link deleted."),
        (status = 404, description = "Unknown respondent.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "responden"
)]
pub async fn delete(
    _session: AdminSession,
    Path(id): Path<i64>,
    respondents: Extension<Arc<dyn RespondentRepository>>,
) -> Response {
    match respondents.delete(id).await {
        Ok(true) => Json(Envelope::message(format!(
            "Responden dengan ID {id} berhasil dihapus"
        )))
        .into_response(),
        Ok(false) => not_found(id),
        Err(err) => store_failure(err),
    }
}
