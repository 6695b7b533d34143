//! Client for the hosted backend-as-a-service.
//!
//! One HTTP client serves three APIs on the same project URL:
//!
//! - **REST** (`/rest/v1/{table}`): PostgREST-style table access, see [`TableQuery`]
//! - **Auth** (`/auth/v1`): password grant, refresh, sign-up, sign-out
//! - **Storage** (`/storage/v1`): object upload and public URLs
//!
//! Every request carries `apikey: <key>`. `Authorization: Bearer` carries
//! the signed-in user's access token when there is one, the key otherwise.

mod auth;
mod error;
mod rest;
mod storage;

pub use auth::*;
pub use error::*;
pub use rest::*;
pub use storage::*;

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, broadcast};

use crate::config::BackendConfig;

/// Capacity of the auth event channel.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Hosted backend client.
///
/// Cheap to clone; clones share the HTTP pool and the auth session.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
    session_file: Option<PathBuf>,
}

impl BackendClient {
    /// Create a client authenticated with the public anon key.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_key(config, config.anon_key.clone())
    }

    /// Create a client authenticated with the service-role key.
    ///
    /// Used by operational tooling only; bypasses row-level security.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` if `BACKEND_SERVICE_KEY` is not set.
    pub fn with_service_role(config: &BackendConfig) -> Result<Self, BackendError> {
        let key = config
            .service_key
            .clone()
            .ok_or_else(|| BackendError::Config("BACKEND_SERVICE_KEY is not set".to_string()))?;
        Self::with_key(config, key)
    }

    fn with_key(config: &BackendConfig, api_key: SecretString) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| BackendError::Config(format!("Invalid API key format: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                api_key,
                session: RwLock::new(None),
                events,
                session_file: config.session_file.clone(),
            }),
        })
    }

    /// Project base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL for a path under the project.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a query against a REST table.
    #[must_use]
    pub fn table(&self, name: &str) -> TableQuery {
        TableQuery::new(self.clone(), name)
    }

    /// Bearer credential for the next request.
    async fn bearer(&self) -> String {
        self.inner.session.read().await.as_ref().map_or_else(
            || self.inner.api_key.expose_secret().to_string(),
            |session| session.access_token.clone(),
        )
    }

    /// Request builder with the bearer header attached.
    pub(crate) async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.bearer().await;
        self.inner.http.request(method, url).bearer_auth(bearer)
    }

    /// Whether the auth API answers its health probe.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend reports unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/auth/v1/health"))
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Handle a response and parse its JSON body.
    pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Handle a response whose body is not needed.
    pub(crate) async fn handle_empty(response: reqwest::Response) -> Result<(), BackendError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Turn a non-success response into a [`BackendError`].
    pub(crate) async fn parse_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        BackendError::from_response_body(status, &body)
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url)
            .field("session_file", &self.inner.session_file)
            .finish_non_exhaustive()
    }
}
