//! Errors returned by the hosted backend client.

use serde::Deserialize;
use thiserror::Error;

/// `PostgreSQL` unique-violation SQLSTATE, surfaced by the REST API.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("API error: {status} [{code}] {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The auth API rejected an email/password pair.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Missing or expired access token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Row, object, or endpoint not found.
    #[error("Not found")]
    NotFound,

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client misconfiguration or a request the client refuses to send.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Whether this is a unique-constraint violation (`23505`).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == UNIQUE_VIOLATION)
    }

    /// Build an error from a non-success status and its response body.
    #[must_use]
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed.message().unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        });

        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound,
            _ => Self::Api {
                status,
                code: parsed.code().unwrap_or_default(),
                message,
            },
        }
    }
}

/// Union of the error shapes returned by the REST, auth, and storage APIs.
///
/// REST: `{code, message, details, hint}`. Auth: `{error, error_description}`
/// or `{code, error_code, msg}`. Storage: `{statusCode, error, message}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    details: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        if let Some(code) = &self.error_code {
            return Some(code.clone());
        }
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => self.error.clone(),
        }
    }

    fn message(&self) -> Option<String> {
        let base = self
            .message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())?;
        Some(match &self.details {
            Some(details) if !details.is_empty() => format!("{base} ({details})"),
            _ => base,
        })
    }
}
