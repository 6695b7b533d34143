//! Custom Askama template filters.
//!
//! Amounts render in rupees with Indian digit grouping and timestamps in
//! IST.

#![allow(clippy::unnecessary_wraps)]

use std::borrow::Borrow;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use neonflake_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a price in rupees.
///
/// Usage in templates: `{{ order.amount|inr }}`
#[askama::filter_fn]
pub fn inr(value: impl Borrow<Price>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.borrow().to_string())
}

/// Formats a timestamp as an IST date.
///
/// Usage in templates: `{{ customer.created_at|date }}`
#[askama::filter_fn]
pub fn date(value: impl Borrow<DateTime<Utc>>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(neonflake_core::time::format_date(value.borrow()))
}

/// Formats a timestamp as an IST date and time.
///
/// Usage in templates: `{{ order.created_at|datetime }}`
#[askama::filter_fn]
pub fn datetime(value: impl Borrow<DateTime<Utc>>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(neonflake_core::time::format_datetime(value.borrow()))
}
