//! Login audit trail repository.

use async_trait::async_trait;
use mockall::automock;

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::models::{LoginAttempt, NewLoginAttempt};

const TABLE: &str = "login_history";

#[automock]
#[async_trait]
pub trait LoginHistoryRepository: Send + Sync {
    /// Append one attempt.
    async fn record(&self, attempt: &NewLoginAttempt) -> Result<(), RepositoryError>;

    /// Every attempt, newest first.
    async fn list(&self) -> Result<Vec<LoginAttempt>, RepositoryError>;
}

/// Login history repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestLoginHistoryRepository {
    client: BackendClient,
}

impl RestLoginHistoryRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoginHistoryRepository for RestLoginHistoryRepository {
    async fn record(&self, attempt: &NewLoginAttempt) -> Result<(), RepositoryError> {
        Ok(self.client.table(TABLE).insert_only(&[attempt]).await?)
    }

    async fn list(&self) -> Result<Vec<LoginAttempt>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .order("login_timestamp", false)
            .fetch()
            .await?)
    }
}
