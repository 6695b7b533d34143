//! Product repository.

use async_trait::async_trait;
use mockall::automock;
use neonflake_core::ProductId;

use super::{RepositoryError, first_row};
use crate::backend::BackendClient;
use crate::models::{Product, ValidProduct};

const TABLE: &str = "products";

#[automock]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every product, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Store a product referencing already-uploaded image paths.
    async fn insert(&self, product: &ValidProduct, images: &[String]) -> Result<Product, RepositoryError>;

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError>;

    /// Products whose name or category contains `term`.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Product>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Product repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestProductRepository {
    client: BackendClient,
}

impl RestProductRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductRepository for RestProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .order("created_at", false)
            .fetch()
            .await?)
    }

    async fn insert(&self, product: &ValidProduct, images: &[String]) -> Result<Product, RepositoryError> {
        let rows = self
            .client
            .table(TABLE)
            .insert(&[product.record(images)])
            .await?;
        first_row(rows, TABLE)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        Ok(self.client.table(TABLE).eq("id", id).delete().await?)
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .ilike_any(&["name", "category"], term)
            .limit(limit)
            .fetch()
            .await?)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.client.table(TABLE).select("id").count().await?)
    }
}
