//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors and transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, signed cookie, in-memory store)
//! 4. Auth guard, as the [`RequireAdminAuth`] extractor on protected routes

pub mod auth;
pub mod session;

pub use auth::{AdminAuthRejection, RequireAdminAuth, clear_current_admin, set_current_admin, take_return_to};
pub use session::{SESSION_COOKIE_NAME, SessionLayerError, create_session_layer};
