//! JSON endpoints used by the page scripts, and toast dismissal.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    response::Redirect,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::middleware::RequireAdminAuth;
use crate::services::{Toast, ToastId};
use crate::state::AppState;

use super::redirect_back;

/// One field value to normalize.
#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub value: String,
}

/// Current toasts plus the display duration.
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub duration_ms: u128,
    pub toasts: Vec<Toast>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/forms/normalize", post(normalize))
        .route("/api/notifications", get(notifications))
        .route("/notifications/{id}/dismiss", post(dismiss))
}

/// POST /api/forms/normalize
async fn normalize(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(request): Json<NormalizeRequest>,
) -> Json<NormalizeResponse> {
    Json(NormalizeResponse {
        value: state.customer_form().normalize_field(&request.field, &request.value),
    })
}

/// GET /api/notifications
async fn notifications(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        duration_ms: state.notifier().duration().as_millis(),
        toasts: state.notifier().snapshot(),
    })
}

/// POST /notifications/{id}/dismiss
///
/// Dismissing an unknown or expired toast is a no-op.
#[instrument(skip(state, headers))]
async fn dismiss(State(state): State<AppState>, Path(id): Path<ToastId>, headers: HeaderMap) -> Redirect {
    state.notifier().dismiss(id);
    redirect_back(&headers, "/")
}
