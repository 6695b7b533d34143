//! Auth API: password sign-in, token refresh, sign-up, sign-out.
//!
//! The client keeps at most one [`AuthSession`]. Every change to it is
//! published as an [`AuthEvent`] on a broadcast channel, and persisted to
//! the configured session file when there is one.

use std::time::Duration;

use chrono::Utc;
use neonflake_core::UserId;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{BackendClient, BackendError};

/// Refresh this long before the access token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The signed-in user as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens for the signed-in user.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which `access_token` expires
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    /// Seconds until the access token should be refreshed.
    #[must_use]
    pub fn refresh_in(&self, now: i64) -> Duration {
        let secs = (self.expires_at - REFRESH_MARGIN_SECS - now).max(0);
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Change in the client's auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
    TokenRefreshed(AuthUser),
    UserUpdated(AuthUser),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at.unwrap_or(now + self.expires_in),
            user: self.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Sign-up returns the user directly, or a session wrapping it when email
/// confirmation is disabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

impl BackendClient {
    /// Exchange an email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidCredentials` when the auth API rejects
    /// the pair, or another error if the request fails.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let url = self.endpoint("/auth/v1/token?grant_type=password");
        let response = self
            .request(Method::POST, &url)
            .await
            .json(&PasswordGrant {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 400 {
            return Err(match Self::parse_error(response).await {
                BackendError::Api { message, .. } => BackendError::InvalidCredentials(message),
                other => other,
            });
        }

        let token: TokenResponse = Self::handle_response(response).await?;
        let session = token.into_session(Utc::now().timestamp());
        self.store_session(Some(session.clone())).await;
        self.emit(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    /// Trade the current refresh token for a new session.
    ///
    /// A rejected refresh token signs the client out.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` when there is no session or the
    /// refresh token was rejected.
    pub async fn refresh_session(&self) -> Result<AuthSession, BackendError> {
        let refresh_token = self
            .current_session()
            .await
            .map(|s| s.refresh_token)
            .ok_or_else(|| BackendError::Unauthorized("no session to refresh".to_string()))?;

        let url = self.endpoint("/auth/v1/token?grant_type=refresh_token");
        let response = self
            .inner
            .http
            .post(&url)
            .json(&RefreshGrant {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 400 || status == 401 {
            let error = Self::parse_error(response).await;
            self.store_session(None).await;
            self.emit(AuthEvent::SignedOut);
            return Err(BackendError::Unauthorized(error.to_string()));
        }

        let token: TokenResponse = Self::handle_response(response).await?;
        let session = token.into_session(Utc::now().timestamp());
        self.store_session(Some(session.clone())).await;
        self.emit(AuthEvent::TokenRefreshed(session.user.clone()));
        Ok(session)
    }

    /// Register a new email/password user.
    ///
    /// # Errors
    ///
    /// Returns error if the auth API rejects the sign-up.
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<AuthUser, BackendError> {
        let url = self.endpoint("/auth/v1/signup");
        let response = self
            .inner
            .http
            .post(&url)
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(&PasswordGrant {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        match Self::handle_response(response).await? {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => Ok(user),
        }
    }

    /// Fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if there is no valid session.
    pub async fn get_user(&self) -> Result<AuthUser, BackendError> {
        if self.current_session().await.is_none() {
            return Err(BackendError::Unauthorized("not signed in".to_string()));
        }
        let url = self.endpoint("/auth/v1/user");
        let response = self.request(Method::GET, &url).await.send().await?;
        let user: AuthUser = Self::handle_response(response).await?;

        let changed = {
            let mut guard = self.inner.session.write().await;
            match guard.as_mut() {
                Some(session) if session.user != user => {
                    session.user = user.clone();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.emit(AuthEvent::UserUpdated(user.clone()));
        }
        Ok(user)
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// The local session is cleared even when the remote call fails.
    ///
    /// # Errors
    ///
    /// Returns the remote error, if any.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let remote = if self.current_session().await.is_some() {
            let url = self.endpoint("/auth/v1/logout");
            match self.request(Method::POST, &url).await.send().await {
                Ok(response) => Self::handle_empty(response).await,
                Err(e) => Err(e.into()),
            }
        } else {
            Ok(())
        };

        self.store_session(None).await;
        self.emit(AuthEvent::SignedOut);
        remote
    }

    /// The current session, if signed in.
    pub async fn current_session(&self) -> Option<AuthSession> {
        self.inner.session.read().await.clone()
    }

    /// Subscribe to auth state changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Load a session from the session file and refresh it.
    ///
    /// Returns `Ok(None)` when no session file is configured or present.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable or the refresh is rejected.
    pub async fn restore_session(&self) -> Result<Option<AuthSession>, BackendError> {
        let Some(path) = self.inner.session_file.as_ref() else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Config(format!("reading session file: {e}"))),
        };
        let session: AuthSession = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::Parse(format!("session file: {e}")))?;

        *self.inner.session.write().await = Some(session);
        self.refresh_session().await.map(Some)
    }

    async fn store_session(&self, session: Option<AuthSession>) {
        self.persist(session.as_ref()).await;
        *self.inner.session.write().await = session;
    }

    async fn persist(&self, session: Option<&AuthSession>) {
        let Some(path) = self.inner.session_file.as_ref() else {
            return;
        };
        let result = match session {
            Some(session) => match serde_json::to_vec(session) {
                Ok(bytes) => tokio::fs::write(path, bytes).await,
                Err(e) => Err(std::io::Error::other(e)),
            },
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist auth session");
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }
}

/// Keep the session fresh for the lifetime of the process.
///
/// Sleeps until shortly before the access token expires, then refreshes.
/// Any auth event re-arms the timer.
pub fn spawn_auto_refresh(client: BackendClient) -> JoinHandle<()> {
    let mut events = client.subscribe();
    tokio::spawn(async move {
        loop {
            let wait = client
                .current_session()
                .await
                .map(|s| s.refresh_in(Utc::now().timestamp()));

            let refresh_due = match wait {
                Some(wait) => tokio::select! {
                    () = tokio::time::sleep(wait) => true,
                    event = events.recv() => match event {
                        Err(broadcast::error::RecvError::Closed) => break,
                        _ => false,
                    },
                },
                None => match events.recv().await {
                    Err(broadcast::error::RecvError::Closed) => break,
                    _ => false,
                },
            };

            if refresh_due {
                match client.refresh_session().await {
                    Ok(_) => tracing::debug!("Auth session refreshed"),
                    Err(e) => tracing::warn!(error = %e, "Auth session refresh failed"),
                }
            }
        }
    })
}
