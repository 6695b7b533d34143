//! Repositories over the hosted backend's REST tables.
//!
//! Each table has a trait (mocked in service and route tests) and a
//! `Rest*` implementation backed by [`BackendClient`].
//!
//! ## Tables
//!
//! - `customers` - customer records (orders embedded via `customer_id`)
//! - `products` - catalog, image paths point into the `product-images` bucket
//! - `orders` - orders with a snapshot of the customer's name and email
//! - `content` - editable page text keyed by slug
//! - `settings` - the single logo settings row
//! - `login_history` - login audit trail

mod content;
mod customers;
mod login_history;
mod orders;
mod products;
mod settings;

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendClient, BackendError};

pub use content::*;
pub use customers::*;
pub use login_history::*;
pub use orders::*;
pub use products::*;
pub use settings::*;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend request failed.
    #[error("backend error: {0}")]
    Backend(BackendError),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<BackendError> for RepositoryError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotFound => Self::NotFound,
            e if e.is_unique_violation() => Self::Conflict(e.to_string()),
            e => Self::Backend(e),
        }
    }
}

/// First row of a write that returns its representation.
fn first_row<T>(rows: Vec<T>, table: &str) -> Result<T, RepositoryError> {
    rows.into_iter().next().ok_or_else(|| {
        RepositoryError::Backend(BackendError::Parse(format!("{table}: write returned no rows")))
    })
}

/// Every repository the dashboard uses.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub login_history: Arc<dyn LoginHistoryRepository>,
}

impl Repositories {
    /// REST-backed repositories sharing one client.
    #[must_use]
    pub fn rest(client: &BackendClient) -> Self {
        Self {
            customers: Arc::new(RestCustomerRepository::new(client.clone())),
            products: Arc::new(RestProductRepository::new(client.clone())),
            orders: Arc::new(RestOrderRepository::new(client.clone())),
            content: Arc::new(RestContentRepository::new(client.clone())),
            settings: Arc::new(RestSettingsRepository::new(client.clone())),
            login_history: Arc::new(RestLoginHistoryRepository::new(client.clone())),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
