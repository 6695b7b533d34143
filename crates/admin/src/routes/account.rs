//! Login history and profile pages.

use askama::Template;
use chrono::{DateTime, Utc};
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use neonflake_core::LoginStatus;
use neonflake_core::listing::{paginate, total_pages};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{LOGIN_HISTORY_PAGE_SIZE, LoginAttempt};
use crate::state::AppState;

use super::{Layout, render};

/// Login attempt row for templates.
#[derive(Debug, Clone)]
pub struct LoginAttemptView {
    pub timestamp: DateTime<Utc>,
    pub email: String,
    pub succeeded: bool,
    pub status: &'static str,
    pub ip_address: String,
    pub user_agent: String,
}

impl From<&LoginAttempt> for LoginAttemptView {
    fn from(attempt: &LoginAttempt) -> Self {
        Self {
            timestamp: attempt.login_timestamp,
            email: attempt.email.clone(),
            succeeded: attempt.login_status == LoginStatus::Success,
            status: attempt.login_status.label(),
            ip_address: attempt.ip_address.clone(),
            user_agent: attempt.user_agent.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "account/login_history.html")]
pub struct LoginHistoryTemplate {
    pub layout: Layout,
    pub attempts: Vec<LoginAttemptView>,
    pub page: usize,
    pub total_pages: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login-history", get(login_history))
        .route("/profile", get(profile))
}

/// GET /login-history
#[instrument(skip(admin, state))]
async fn login_history(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let attempts = match state.login_history().list().await {
        Ok(attempts) => attempts,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load login history");
            state.notifier().error("Failed to load login history");
            Vec::new()
        }
    };

    let page = query
        .page
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1_usize);
    let pages = total_pages(attempts.len(), LOGIN_HISTORY_PAGE_SIZE);
    let link = |page: usize| format!("/login-history?page={page}");

    let template = LoginHistoryTemplate {
        layout: Layout::new(&state, &admin, "/login-history"),
        attempts: paginate(&attempts, page, LOGIN_HISTORY_PAGE_SIZE)
            .iter()
            .map(LoginAttemptView::from)
            .collect(),
        page,
        total_pages: pages,
        previous: (page > 1).then(|| link(page - 1)),
        next: (page < pages).then(|| link(page + 1)),
    };
    render(&template)
}

/// GET /profile
#[instrument(skip(admin, state))]
async fn profile(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let (email, user_id) = state.auth().refresh_identity().await.map_or_else(
        || (admin.email.clone(), admin.id.to_string()),
        |identity| (identity.email, identity.user_id.to_string()),
    );
    let template = ProfileTemplate {
        layout: Layout::new(&state, &admin, "/profile"),
        email,
        user_id,
    };
    render(&template)
}
