//! Admin dashboard under `/dashboard`.

use super::{guard::AdminSession, Envelope};
use crate::{
    auth::{AdminAuthService, AdminClaims, LoginEvent},
    store::{LinkRepository, LinkStats, RespondentRepository, StoreError},
};
use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

const RECENT_ACTIVITY: usize = 5;
const LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RespondentStats {
    pub total: u64,
    /// Respondents whose link has been opened.
    pub completed: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub responden: RespondentStats,
    pub tautan: LinkStats,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub welcome: String,
    pub stats: DashboardStats,
    pub recent_activity: Vec<LoginEvent>,
}

/// The dashboard envelope also echoes the signed-in admin.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardBody {
    pub success: bool,
    pub message: String,
    pub data: DashboardData,
    pub user: AdminClaims,
}

async fn collect_stats(
    respondents: &dyn RespondentRepository,
    links: &dyn LinkRepository,
) -> Result<DashboardStats, StoreError> {
    let total = respondents.count().await?;
    let tautan = links.stats().await?;
    Ok(DashboardStats {
        responden: RespondentStats {
            total,
            completed: tautan.used,
            pending: total.saturating_sub(tautan.used),
        },
        tautan,
    })
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Welcome message, counts and recent logins.", body = DashboardBody),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
        (status = 403, description = "Token does not carry the admin role.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "dashboard"
)]
pub async fn overview(
    session: AdminSession,
    auth: Extension<Arc<AdminAuthService>>,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    links: Extension<Arc<dyn LinkRepository>>,
) -> Response {
    let stats = match collect_stats(&**respondents, &**links).await {
        Ok(stats) => stats,
        Err(err) => return err.into_response(),
    };

    Json(DashboardBody {
        success: true,
        message: "Dashboard data berhasil diambil".to_string(),
        data: DashboardData {
            welcome: format!("Selamat datang, {}!", session.claims.username),
            stats,
            recent_activity: auth.recent_logins(RECENT_ACTIVITY),
        },
        user: session.claims,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/dashboard/statistics",
    responses(
        (status = 200, description = "Respondent and link counts.", body = DashboardStats),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "dashboard"
)]
pub async fn statistics(
    _session: AdminSession,
    respondents: Extension<Arc<dyn RespondentRepository>>,
    links: Extension<Arc<dyn LinkRepository>>,
) -> Response {
    match collect_stats(&**respondents, &**links).await {
        Ok(stats) => Json(Envelope::ok("Statistik dashboard", stats)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/dashboard/logs",
    responses(
        (status = 200, description = "Recent admin login attempts, newest first.", body = [LoginEvent]),
        (status = 401, description = "Missing, malformed or invalid token.", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "dashboard"
)]
pub async fn logs(_session: AdminSession, auth: Extension<Arc<AdminAuthService>>) -> Response {
    Json(Envelope::ok("Activity logs", auth.recent_logins(LOG_LIMIT))).into_response()
}
