//! Order repository.

use async_trait::async_trait;
use mockall::automock;
use neonflake_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::models::{Order, OrderPatch};

const TABLE: &str = "orders";

#[automock]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Orders, newest first, optionally restricted to one status.
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError>;

    async fn get(&self, id: &OrderId) -> Result<Order, RepositoryError>;

    /// Apply `patch` and return the row as stored.
    async fn update(&self, id: &OrderId, patch: &OrderPatch) -> Result<Order, RepositoryError>;

    /// Orders whose id, customer name, or customer email contains `term`.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Order>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Order repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestOrderRepository {
    client: BackendClient,
}

impl RestOrderRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderRepository for RestOrderRepository {
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let mut query = self.client.table(TABLE).select("*");
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        Ok(query.order("created_at", false).fetch().await?)
    }

    async fn get(&self, id: &OrderId) -> Result<Order, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .eq("id", id)
            .fetch_one()
            .await?)
    }

    async fn update(&self, id: &OrderId, patch: &OrderPatch) -> Result<Order, RepositoryError> {
        let rows: Vec<Order> = self
            .client
            .table(TABLE)
            .eq("id", id)
            .update(patch)
            .await?;
        // An empty representation means the filter matched nothing
        rows.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .ilike_any(&["id", "customer_name", "customer_email"], term)
            .limit(limit)
            .fetch()
            .await?)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.client.table(TABLE).select("id").count().await?)
    }
}
