//! Authentication route handlers for admin.
//!
//! Email/password sign-in against the hosted backend. A successful login
//! stores the admin in the browser session; the process-wide identity
//! holder is updated by [`AuthService`](crate::services::AuthService).

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin, take_return_to};
use crate::models::{CurrentAdmin, session_keys};
use crate::services::{ClientInfo, Credentials, Toast};
use crate::state::AppState;

use super::render;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    toasts: Vec<Toast>,
    toast_ms: u128,
}

impl LoginPageTemplate {
    fn new(state: &AppState, email: String) -> Self {
        Self {
            email,
            toasts: state.notifier().snapshot(),
            toast_ms: state.notifier().duration().as_millis(),
        }
    }
}

/// Login form fields.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Render the login page, or skip it when already signed in.
///
/// GET /login
async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    let admin: Option<CurrentAdmin> = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten();
    let signed_in = admin
        .zip(state.identity().identity())
        .is_some_and(|(admin, identity)| admin.id == identity.user_id);
    if signed_in {
        return Redirect::to("/").into_response();
    }

    render(&LoginPageTemplate::new(&state, String::new()))
}

/// Sign in with email and password.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = Credentials {
        email: form.email,
        password: SecretString::from(form.password),
    };

    match state.auth().login(&credentials, &client).await {
        Ok(identity) => {
            if let Err(e) = set_current_admin(&session, &CurrentAdmin::from(&identity)).await {
                tracing::error!(error = %e, "Failed to store admin in session");
                state.notifier().error("Login failed. Please try again.");
                return render(&LoginPageTemplate::new(&state, credentials.email));
            }
            state.notifier().success("Welcome back!");
            Redirect::to(&take_return_to(&session).await).into_response()
        }
        Err(e) => {
            state.notifier().error(e.user_message());
            render(&LoginPageTemplate::new(&state, credentials.email))
        }
    }
}

/// Sign out of the backend and clear the browser session.
///
/// POST /logout
#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    state.auth().logout().await;

    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    crate::error::clear_sentry_user();

    Redirect::to("/login")
}
