//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Backend reachable
//!
//! # Auth
//! GET  /login                         - Login page
//! POST /login                         - Email/password sign-in
//! POST /logout                        - Sign out
//!
//! # Dashboard & reports
//! GET  /                              - Dashboard overview
//! GET  /reports                       - Range report (?range=)
//!
//! # Customers
//! GET  /customers                     - List (?q=&sort=&dir=&per_page=&page=)
//! GET  /customers/export              - CSV of the filtered list
//! GET  /customers/new                 - Create form
//! POST /customers                     - Create
//! GET  /customers/{id}                - Details
//! GET  /customers/{id}/edit           - Edit form
//! POST /customers/{id}                - Update
//! POST /customers/{id}/delete         - Delete
//!
//! # Products
//! GET  /products                      - List (+ &category=&status=)
//! GET  /products/new                  - Create form
//! POST /products                      - Create (multipart, images)
//! POST /products/{id}/delete          - Delete
//!
//! # Orders
//! GET  /orders                        - List (+ &field=&status=)
//! GET  /orders/new                    - New orders
//! GET  /orders/new/export             - CSV of the filtered new orders
//! POST /orders/{id}/{command}         - process | cancel | deliver | accept_payment
//!
//! # Settings
//! GET  /settings                      - Settings index
//! GET  /settings/content/{slug}       - Content editor
//! POST /settings/content/{slug}       - Save content
//! GET  /settings/application-name     - Application name
//! POST /settings/application-name
//! GET  /settings/social-links         - Social links
//! POST /settings/social-links
//! GET  /settings/logos                - Logos
//! POST /settings/logos/{kind}         - Upload (multipart)
//! POST /settings/logos/{kind}/remove  - Clear
//!
//! # Account
//! GET  /login-history                 - Login audit trail
//! GET  /profile                       - Current identity
//!
//! # Search & notifications
//! GET  /search                        - Global search page
//! GET  /api/search                    - Global search (JSON)
//! POST /api/forms/normalize           - Normalize one form field (JSON)
//! GET  /api/notifications             - Current toasts (JSON)
//! POST /notifications/{id}/dismiss    - Dismiss a toast
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod reports;
pub mod search;
pub mod settings;

use askama::Template;
use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::models::CurrentAdmin;
use crate::services::{ImageUpload, Toast};
use crate::state::AppState;

/// Layout data shared by every authenticated page.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_email: String,
    pub current_path: &'static str,
    pub toasts: Vec<Toast>,
    pub toast_ms: u128,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, admin: &CurrentAdmin, current_path: &'static str) -> Self {
        Self {
            admin_email: admin.email.clone(),
            current_path,
            toasts: state.notifier().snapshot(),
            toast_ms: state.notifier().duration().as_millis(),
        }
    }

    /// Whether the nav entry for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

/// Render a template, logging failures as a 500.
pub(crate) fn render(template: &impl Template) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Redirect to the page the request came from, or `fallback`.
///
/// Only same-origin paths are followed.
pub(crate) fn redirect_back(headers: &HeaderMap, fallback: &str) -> Redirect {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        })
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| fallback.to_string());
    Redirect::to(&target)
}

/// A CSV attachment response.
pub(crate) fn csv_download(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Read one multipart file field. An empty file input yields `None`.
pub(crate) async fn read_upload(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<ImageUpload>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if bytes.is_empty() && file_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

/// Build the routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(account::router())
        .merge(dashboard::router())
        .merge(reports::router())
        .merge(customers::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(settings::router())
        .merge(search::router())
        .merge(api::router())
}
