//! Session/identity holder and the login flow.
//!
//! [`IdentityHolder`] is the process-wide answer to "who is signed in to
//! the backend, and do we know yet". It starts out loading, is resolved
//! once by [`AuthService::initialize`], and afterwards mirrors every
//! [`AuthEvent`] the backend client publishes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use neonflake_core::{LoginStatus, UserId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::backend::{AuthEvent, AuthUser, BackendClient, BackendError};
use crate::db::LoginHistoryRepository;
use crate::models::NewLoginAttempt;

/// The signed-in backend user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

/// Point-in-time view of the holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// The initial session lookup has not finished.
    pub loading: bool,
}

/// Shared `{identity, loading}` state.
#[derive(Debug, Clone)]
pub struct IdentityHolder {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for IdentityHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityHolder {
    /// No identity, still loading.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot {
            identity: None,
            loading: true,
        });
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    /// Watch for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        self.tx.send_modify(|state| state.identity = identity);
    }

    /// Record the result of the initial lookup.
    pub fn finish_loading(&self, identity: Option<Identity>) {
        self.tx.send_modify(|state| {
            state.identity = identity;
            state.loading = false;
        });
    }

    /// Mirror one backend auth event.
    pub fn apply(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user) | AuthEvent::TokenRefreshed(user) | AuthEvent::UserUpdated(user) => {
                self.set_identity(Some(user.into()));
            }
            AuthEvent::SignedOut => self.set_identity(None),
        }
    }
}

/// The slice of the backend auth API the dashboard uses.
#[automock]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Resolve a persisted session, if any.
    async fn restore(&self) -> Result<Option<AuthUser>, BackendError>;

    /// The signed-in user as the backend currently has it.
    async fn current_user(&self) -> Result<AuthUser, BackendError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
impl AuthGateway for BackendClient {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, BackendError> {
        self.sign_in_with_password(email, password)
            .await
            .map(|session| session.user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        Self::sign_out(self).await
    }

    async fn restore(&self) -> Result<Option<AuthUser>, BackendError> {
        Ok(self.restore_session().await?.map(|session| session.user))
    }

    async fn current_user(&self) -> Result<AuthUser, BackendError> {
        self.get_user().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        Self::subscribe(self)
    }
}

/// Errors from the login flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password left blank.
    #[error("email and password are required")]
    MissingCredentials,

    /// The backend rejected the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend could not be reached or failed.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl AuthError {
    /// Message safe to show on the login page.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Please enter your email and password",
            Self::InvalidCredentials => "Invalid credentials",
            Self::Backend(_) => "Login failed. Please try again.",
        }
    }
}

/// Email and password from the login form.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Request metadata recorded with each login attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

/// Login, logout, and identity bookkeeping.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    holder: IdentityHolder,
    login_history: Arc<dyn LoginHistoryRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        holder: IdentityHolder,
        login_history: Arc<dyn LoginHistoryRepository>,
    ) -> Self {
        Self {
            gateway,
            holder,
            login_history,
        }
    }

    #[must_use]
    pub const fn holder(&self) -> &IdentityHolder {
        &self.holder
    }

    /// Resolve the initial session, then mirror auth events for the life
    /// of the process.
    ///
    /// Returns the listener task.
    pub async fn initialize(&self) -> JoinHandle<()> {
        let mut events = self.gateway.subscribe();

        let identity = match self.gateway.restore().await {
            Ok(user) => user.map(Identity::from),
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore auth session");
                None
            }
        };
        tracing::info!(signed_in = identity.is_some(), "Auth session resolved");
        self.holder.finish_loading(identity);

        let holder = self.holder.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        tracing::debug!(?event, "Auth state changed");
                        holder.apply(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Sign in with email and password.
    ///
    /// Every attempt that reaches the backend is recorded in the login
    /// history; a failed audit write is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the backend rejects the
    /// pair. The identity is unchanged on any error.
    pub async fn login(&self, credentials: &Credentials, client: &ClientInfo) -> Result<Identity, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        if email.is_empty() || credentials.password.expose_secret().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let result = self.gateway.sign_in(&email, &credentials.password).await;

        let (status, user_id) = match &result {
            Ok(user) => (LoginStatus::Success, Some(user.id.clone())),
            Err(_) => (LoginStatus::Failed, None),
        };
        self.record_attempt(NewLoginAttempt {
            user_id,
            email: email.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            login_status: status,
            login_timestamp: Utc::now(),
        })
        .await;

        match result {
            Ok(user) => {
                let identity = Identity::from(user);
                tracing::info!(user_id = %identity.user_id, "Admin signed in");
                self.holder.set_identity(Some(identity.clone()));
                Ok(identity)
            }
            Err(BackendError::InvalidCredentials(reason)) => {
                tracing::info!(email = %email, reason = %reason, "Login rejected");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!(error = %e, "Login request failed");
                Err(AuthError::Backend(e))
            }
        }
    }

    /// Sign out remotely (best effort) and clear the identity.
    pub async fn logout(&self) {
        if let Err(e) = self.gateway.sign_out().await {
            tracing::warn!(error = %e, "Backend sign-out failed");
        }
        self.holder.set_identity(None);
    }

    /// Re-read the signed-in user from the backend, keeping the held
    /// identity if the lookup fails.
    pub async fn refresh_identity(&self) -> Option<Identity> {
        match self.gateway.current_user().await {
            Ok(user) => {
                let identity = Identity::from(user);
                self.holder.set_identity(Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not refresh signed-in user");
                self.holder.identity()
            }
        }
    }

    async fn record_attempt(&self, attempt: NewLoginAttempt) {
        if let Err(e) = self.login_history.record(&attempt).await {
            tracing::warn!(error = %e, email = %attempt.email, "Failed to record login attempt");
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("holder", &self.holder)
            .finish_non_exhaustive()
    }
}
