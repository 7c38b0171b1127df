use crate::auth::password;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub password: SecretString,
}

/// Print a bcrypt hash of the given password on stdout.
/// # Errors
/// Returns an error if hashing fails.
pub async fn execute(args: Args) -> Result<()> {
    let hash = tokio::task::spawn_blocking(move || {
        password::hash_password(args.password.expose_secret())
    })
    .await
    .context("Hashing task failed")?
    .context("Failed to hash password")?;

    println!("{hash}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_succeeds() {
        let args = Args {
            password: SecretString::from("password123".to_string()),
        };
        assert!(execute(args).await.is_ok());
    }
}
