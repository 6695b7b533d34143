//! Session middleware configuration for admin.
//!
//! Sessions live in process memory and the cookie is signed with a key
//! derived from `ADMIN_SESSION_SECRET` (SameSite=Strict, 24hr inactivity
//! expiry). A restart signs everyone out, matching the backend session,
//! which is also held in memory.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "nf_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
#[error("invalid session signing key: {0}")]
pub struct SessionLayerError(String);

/// 64-byte cookie signing key derived from the session secret.
fn signing_key(config: &AdminConfig) -> Result<Key, SessionLayerError> {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::try_from(digest.as_slice()).map_err(|e| SessionLayerError(e.to_string()))
}

/// Create the session layer with an in-memory store.
///
/// # Errors
///
/// Returns an error if the signing key cannot be derived.
pub fn create_session_layer(
    config: &AdminConfig,
) -> Result<SessionManagerLayer<MemoryStore, tower_sessions::service::SignedCookie>, SessionLayerError> {
    let key = signing_key(config)?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
