//! HTTP surface.
//!
//! Services are shared with handlers through `Extension` layers. The router
//! is built by [`router`] so the server and the integration tests drive the
//! exact same wiring.

pub mod error;
pub mod handlers;
pub mod openapi;

use crate::{
    auth::{AdminAuthService, AuthConfig, LoginAttemptTracker},
    link::{LinkConfig, LinkService},
    mailer::{LogMailer, Mailer, SmtpConfig, SmtpMailer},
    store::{HealthCheck, LinkRepository, PgStore, RespondentRepository, UserRepository},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    response::Json,
    routing::{get, post},
    Router,
};
use handlers::{admin, dashboard, email, health, link, respondent};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;

/// Runtime settings for the services behind the router.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub auth: AuthConfig,
    pub links: LinkConfig,
    pub smtp: Option<SmtpConfig>,
}

/// Everything the handlers pull out of request extensions.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AdminAuthService>,
    pub links: Arc<LinkService>,
    pub respondents: Arc<dyn RespondentRepository>,
    pub link_store: Arc<dyn LinkRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppServices {
    /// Wire every service on top of one store and one mailer.
    pub fn new<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, settings: &Settings) -> Self
    where
        S: UserRepository + RespondentRepository + LinkRepository + HealthCheck + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let respondents: Arc<dyn RespondentRepository> = store.clone();
        let link_store: Arc<dyn LinkRepository> = store.clone();
        let health: Arc<dyn HealthCheck> = store;

        let attempts = Arc::new(LoginAttemptTracker::new(settings.auth.lockout()));
        let auth = Arc::new(AdminAuthService::new(users, attempts, &settings.auth));
        let links = Arc::new(LinkService::new(
            link_store.clone(),
            respondents.clone(),
            mailer.clone(),
            &settings.links,
        ));

        Self {
            auth,
            links,
            respondents,
            link_store,
            mailer,
            health,
        }
    }
}

/// Build the application router with every route and service attached.
pub fn router(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(health::health).options(health::health))
        .route("/openapi.json", get(|| async { Json(openapi::openapi()) }))
        .route("/auth/admin/login", post(admin::login))
        .route("/auth/admin/verify", get(admin::verify))
        .route("/auth/admin/profile", get(admin::profile))
        .route("/auth/admin/logout", post(admin::logout))
        .route("/dashboard", get(dashboard::overview))
        .route("/dashboard/statistics", get(dashboard::statistics))
        .route("/dashboard/logs", get(dashboard::logs))
        .route("/api/link/get-form", post(link::get_form))
        .route("/api/link/tautan", post(link::create_link))
        .route("/api/link/generate-token", post(link::generate_token))
        .route("/api/link/encrypt", post(link::encrypt))
        .route("/api/link/decrypt", post(link::decrypt))
        .route(
            "/api/link/set-landingPage-link",
            post(link::set_landing_page_link),
        )
        .route("/api/link/set-formPage-link", post(link::set_form_page_link))
        .route("/api/link/send-bulk", post(link::send_bulk))
        .route("/api/email/send", post(email::send))
        .route("/api/email/send-bulk", post(email::send_bulk))
        .route("/responden", get(respondent::list).post(respondent::create))
        .route(
            "/responden/:id",
            get(respondent::find)
                .patch(respondent::update)
                .delete(respondent::delete),
        )
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services.auth))
                .layer(Extension(services.links))
                .layer(Extension(services.respondents))
                .layer(Extension(services.link_store))
                .layer(Extension(services.mailer))
                .layer(Extension(services.health)),
        )
}

fn mailer_from(settings: &Settings) -> Result<Arc<dyn Mailer>> {
    match &settings.smtp {
        Some(config) => {
            let mailer = SmtpMailer::new(config).context("Failed to configure SMTP transport")?;
            info!(host = %config.host, port = config.port, "Using SMTP mailer");
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("No SMTP host configured, outgoing mail is only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Connect to the database, apply migrations and serve until ctrl-c.
///
/// # Errors
/// Returns an error if the database is unreachable, migrations fail or the
/// listener cannot bind.
pub async fn new(port: u16, dsn: String, settings: Settings) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let mailer = mailer_from(&settings)?;
    let services = AppServices::new(Arc::new(PgStore::new(pool)), mailer, &settings);

    let app = router(services).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = route,
        request_id
    )
}
