//! Authentication extractors for admin.
//!
//! A request is admitted when the browser session names an admin and that
//! admin is the identity the process-wide holder currently has.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::{CurrentAdmin, session_keys};
use crate::services::{ClientInfo, Identity};
use crate::state::AppState;

/// Shown while the initial backend session lookup is still running.
const LOADING_PAGE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><meta http-equiv="refresh" content="1">
<title>Loading</title><link rel="stylesheet" href="/static/admin.css"></head>
<body class="loading"><div class="spinner" role="status">Loading...</div></body></html>"#;

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
#[derive(Debug)]
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Why a protected request was not admitted.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// The startup session lookup has not finished yet.
    Loading { api: bool },
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Loading { api: true } => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            Self::Loading { api: false } => Html(LOADING_PAGE).into_response(),
        }
    }
}

impl From<&Identity> for CurrentAdmin {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id.clone(),
            email: identity.email.clone(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");
        let denied = || {
            if is_api {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        };

        let snapshot = state.identity().snapshot();
        if snapshot.loading {
            return Err(AdminAuthRejection::Loading { api: is_api });
        }

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();

        let Some(admin) = admin else {
            if !is_api && parts.method == Method::GET {
                let return_to = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
                if let Err(e) = session.insert(session_keys::RETURN_TO, return_to).await {
                    tracing::warn!(error = %e, "Failed to store return path");
                }
            }
            return Err(denied());
        };

        // The backend session may have ended (sign-out, failed refresh) or
        // belong to someone else since this cookie was issued.
        match &snapshot.identity {
            Some(identity) if identity.user_id == admin.id => {}
            _ => {
                tracing::info!(admin_id = %admin.id, "Browser session no longer matches backend identity");
                if let Err(e) = clear_current_admin(&session).await {
                    tracing::warn!(error = %e, "Failed to clear stale admin session");
                }
                return Err(denied());
            }
        }

        set_sentry_user(&admin);
        Ok(Self(admin))
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        Ok(Self {
            ip_address: forwarded.or_else(peer).unwrap_or_else(|| "unknown".to_string()),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string(),
        })
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

/// Take the path stored when an unauthenticated request was redirected.
pub async fn take_return_to(session: &Session) -> String {
    session
        .remove::<String>(session_keys::RETURN_TO)
        .await
        .ok()
        .flatten()
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn client_info(request: Request<()>) -> ClientInfo {
        let (mut parts, ()) = request.into_parts();
        match ClientInfo::from_request_parts(&mut parts, &()).await {
            Ok(info) => info,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn test_client_info_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header(header::USER_AGENT, "Mozilla/5.0")
            .body(())
            .unwrap_or_default();
        let info = client_info(request).await;
        assert_eq!(info.ip_address, "203.0.113.7");
        assert_eq!(info.user_agent, "Mozilla/5.0");
    }

    #[tokio::test]
    async fn test_client_info_falls_back_to_peer_address() {
        let mut request = Request::builder().body(()).unwrap_or_default();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 50000))));
        let info = client_info(request).await;
        assert_eq!(info.ip_address, "192.0.2.10");
        assert_eq!(info.user_agent, "unknown");
    }

    #[test]
    fn test_loading_rejection_statuses() {
        let api = AdminAuthRejection::Loading { api: true }.into_response();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        let page = AdminAuthRejection::Loading { api: false }.into_response();
        assert_eq!(page.status(), StatusCode::OK);
        let redirect = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.headers().get(header::LOCATION).map(|v| v.as_bytes()), Some(&b"/login"[..]));
    }
}
