use crate::{
    api::Settings,
    auth::AuthConfig,
    cli::{
        actions::{hash_password, server, Action},
        commands::{
            auth::{
                ARG_ADMIN_TOKEN_TTL, ARG_JWT_SECRET, ARG_JWT_SECRET_ADMIN, ARG_LINK_SESSION_TTL,
                ARG_LOCKOUT_THRESHOLD, ARG_LOCKOUT_WINDOW, ARG_SECRET_KEY,
            },
            smtp::{
                ARG_SMTP_FROM_EMAIL, ARG_SMTP_FROM_NAME, ARG_SMTP_HOST, ARG_SMTP_PASSWORD,
                ARG_SMTP_PORT, ARG_SMTP_USER,
            },
            CMD_HASH_PASSWORD,
        },
    },
    link::LinkConfig,
    mailer::SmtpConfig,
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;

fn secret(matches: &ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.clone()))
}

fn auth_config(matches: &ArgMatches) -> AuthConfig {
    let mut config = AuthConfig::new()
        .with_jwt_secret_admin(secret(matches, ARG_JWT_SECRET_ADMIN))
        .with_secret_key(secret(matches, ARG_SECRET_KEY));
    if let Some(ttl) = matches.get_one::<u64>(ARG_ADMIN_TOKEN_TTL) {
        config = config.with_token_ttl_seconds(*ttl);
    }
    if let Some(threshold) = matches.get_one::<u32>(ARG_LOCKOUT_THRESHOLD) {
        config = config.with_lockout_threshold(*threshold);
    }
    if let Some(minutes) = matches.get_one::<u64>(ARG_LOCKOUT_WINDOW) {
        config = config.with_lockout_window(Duration::from_secs(minutes.saturating_mul(60)));
    }
    config
}

fn link_config(matches: &ArgMatches) -> LinkConfig {
    let config = LinkConfig::new()
        .with_jwt_secret(secret(matches, ARG_JWT_SECRET))
        .with_secret_key(secret(matches, ARG_SECRET_KEY));
    match matches.get_one::<u64>(ARG_LINK_SESSION_TTL) {
        Some(ttl) => config.with_session_ttl_seconds(*ttl),
        None => config,
    }
}

fn smtp_config(matches: &ArgMatches) -> Result<Option<SmtpConfig>> {
    let Some(host) = matches.get_one::<String>(ARG_SMTP_HOST).cloned() else {
        return Ok(None);
    };

    let user = matches.get_one::<String>(ARG_SMTP_USER).cloned();
    let from_email = matches
        .get_one::<String>(ARG_SMTP_FROM_EMAIL)
        .cloned()
        .or_else(|| user.clone())
        .context("missing sender address: set --smtp-from-email or --smtp-user")?;

    let mut config = SmtpConfig::new(host, from_email)
        .with_from_name(matches.get_one::<String>(ARG_SMTP_FROM_NAME).cloned());
    if let Some(port) = matches.get_one::<u16>(ARG_SMTP_PORT) {
        config = config.with_port(*port);
    }
    if let (Some(user), Some(password)) = (user, secret(matches, ARG_SMTP_PASSWORD)) {
        config = config.with_credentials(user, password);
    }
    Ok(Some(config))
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    if let Some(sub) = matches.subcommand_matches(CMD_HASH_PASSWORD) {
        let password = secret(sub, "password").context("missing required argument: password")?;
        return Ok(Action::HashPassword(hash_password::Args { password }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        settings: Settings {
            auth: auth_config(matches),
            links: link_config(matches),
            smtp: smtp_config(matches)?,
        },
    }))
}
