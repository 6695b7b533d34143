//! Records mirrored from backend tables.
//!
//! Rows deserialize straight from the REST API. Write payloads are
//! separate borrowed structs so a form never sends columns it does not own.

mod content;
mod customer;
mod login_history;
mod order;
mod product;
mod session;
mod settings;

pub use content::*;
pub use customer::*;
pub use login_history::*;
pub use order::*;
pub use product::*;
pub use session::*;
pub use settings::*;

use serde::{Deserialize, Deserializer};

/// Read a nullable text column as an empty string.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `None` for a blank form value.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
