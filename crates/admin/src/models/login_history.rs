//! Login audit trail.

use chrono::{DateTime, Utc};
use neonflake_core::{LoginAttemptId, LoginStatus, UserId};
use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// Fixed page size of the login history page.
pub const LOGIN_HISTORY_PAGE_SIZE: usize = 10;

/// A row of the `login_history` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: LoginAttemptId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_agent: String,
    pub login_status: LoginStatus,
    pub login_timestamp: DateTime<Utc>,
}

/// Columns written for a new attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLoginAttempt {
    pub user_id: Option<UserId>,
    pub email: String,
    pub ip_address: String,
    pub user_agent: String,
    pub login_status: LoginStatus,
    pub login_timestamp: DateTime<Utc>,
}
