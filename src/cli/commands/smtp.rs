use clap::{Arg, Command};

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USER: &str = "smtp-user";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM_EMAIL: &str = "smtp-from-email";
pub const ARG_SMTP_FROM_NAME: &str = "smtp-from-name";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host; without it outgoing mail is only logged")
                .env("TAUTAN_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port (implicit TLS)")
                .env("TAUTAN_SMTP_PORT")
                .default_value("465")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USER)
                .long(ARG_SMTP_USER)
                .help("SMTP username")
                .env("TAUTAN_SMTP_USER")
                .requires(ARG_SMTP_PASSWORD),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("TAUTAN_SMTP_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_SMTP_USER),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM_EMAIL)
                .long(ARG_SMTP_FROM_EMAIL)
                .help("Sender address; defaults to the SMTP username")
                .env("TAUTAN_SMTP_FROM_EMAIL"),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM_NAME)
                .long(ARG_SMTP_FROM_NAME)
                .help("Sender display name")
                .env("TAUTAN_SMTP_FROM_NAME"),
        )
}
