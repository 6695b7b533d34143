//! Dashboard login management.
//!
//! Logins are ordinary email/password users of the backend auth API; there
//! is no separate admin table.

use neonflake_admin::backend::{BackendClient, BackendError};
use neonflake_admin::config::{BackendConfig, ConfigError};
use neonflake_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Shortest password the auth API accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Check the arguments before any network call.
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` or `UserError::WeakPassword`.
pub fn validate(email: &str, password: &SecretString) -> Result<Email, UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::WeakPassword);
    }
    Ok(email)
}

/// Register a login with the backend auth API.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, configuration is missing,
/// or the auth API rejects the sign-up.
pub async fn create(email: &str, password: SecretString) -> Result<(), UserError> {
    let email = validate(email, &password)?;

    let config = BackendConfig::from_env()?;
    let client = BackendClient::new(&config)?;

    tracing::info!(email = %email, "Registering login");
    let user = client.sign_up(email.as_str(), &password).await?;
    tracing::info!(user_id = %user.id, "Login created; confirm the email if the project requires it");
    Ok(())
}
