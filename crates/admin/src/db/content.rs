//! Content block repository.

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::models::{ContentBlock, ContentUpdate, NewContentRecord};

const TABLE: &str = "content";

#[automock]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// The block stored under `slug`, if any.
    async fn get(&self, slug: &str) -> Result<Option<ContentBlock>, RepositoryError>;

    async fn exists(&self, slug: &str) -> Result<bool, RepositoryError>;

    /// Create the block with `updated_at = now`.
    async fn insert(&self, slug: &str, content: &str) -> Result<(), RepositoryError>;

    /// Replace the block's text with `updated_at = now`.
    async fn update(&self, slug: &str, content: &str) -> Result<(), RepositoryError>;
}

/// Content repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestContentRepository {
    client: BackendClient,
}

impl RestContentRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentRepository for RestContentRepository {
    async fn get(&self, slug: &str) -> Result<Option<ContentBlock>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .eq("id", slug)
            .fetch_optional()
            .await?)
    }

    async fn exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let row: Option<serde_json::Value> = self
            .client
            .table(TABLE)
            .select("id")
            .eq("id", slug)
            .fetch_optional()
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, slug: &str, content: &str) -> Result<(), RepositoryError> {
        let record = NewContentRecord {
            id: slug,
            content,
            updated_at: Utc::now(),
        };
        Ok(self.client.table(TABLE).insert_only(&[record]).await?)
    }

    async fn update(&self, slug: &str, content: &str) -> Result<(), RepositoryError> {
        let update = ContentUpdate {
            content,
            updated_at: Utc::now(),
        };
        let rows: Vec<ContentBlock> = self.client.table(TABLE).eq("id", slug).update(&update).await?;
        if rows.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
