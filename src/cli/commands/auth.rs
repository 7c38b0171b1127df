use crate::{
    auth::config::{ENV_JWT_SECRET_ADMIN, ENV_SECRET_KEY},
    link::config::ENV_JWT_SECRET,
};
use clap::{Arg, Command};

pub const ARG_JWT_SECRET_ADMIN: &str = "jwt-secret-admin";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_ADMIN_TOKEN_TTL: &str = "admin-token-ttl";
pub const ARG_LINK_SESSION_TTL: &str = "link-session-ttl";
pub const ARG_LOCKOUT_THRESHOLD: &str = "lockout-threshold";
pub const ARG_LOCKOUT_WINDOW: &str = "lockout-window";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET_ADMIN)
                .long(ARG_JWT_SECRET_ADMIN)
                .help("Signing secret for admin sessions (falls back to --secret-key)")
                .env(ENV_JWT_SECRET_ADMIN)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Signing secret for link sessions (falls back to --secret-key)")
                .env(ENV_JWT_SECRET)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Shared secret: link cipher key and fallback signing secret")
                .env(ENV_SECRET_KEY)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_TOKEN_TTL)
                .long(ARG_ADMIN_TOKEN_TTL)
                .help("Admin session lifetime in seconds")
                .env("TAUTAN_ADMIN_TOKEN_TTL")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_LINK_SESSION_TTL)
                .long(ARG_LINK_SESSION_TTL)
                .help("Link session lifetime in seconds")
                .env("TAUTAN_LINK_SESSION_TTL")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_THRESHOLD)
                .long(ARG_LOCKOUT_THRESHOLD)
                .help("Failed logins before an account is locked")
                .env("TAUTAN_LOCKOUT_THRESHOLD")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_WINDOW)
                .long(ARG_LOCKOUT_WINDOW)
                .help("Lockout window in minutes")
                .env("TAUTAN_LOCKOUT_WINDOW_MINUTES")
                .default_value("15")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
