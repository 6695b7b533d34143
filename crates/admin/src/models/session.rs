//! Types stored in the browser session.

use neonflake_core::UserId;
use serde::{Deserialize, Serialize};

/// The admin signed in on this browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: String,
}

/// Session keys.
pub mod session_keys {
    /// The current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
    /// Where to go after login.
    pub const RETURN_TO: &str = "return_to";
}
