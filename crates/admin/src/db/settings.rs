//! Settings repository.

use async_trait::async_trait;
use mockall::automock;

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::models::{LogoKind, SETTINGS_ROW_ID, Settings, logo_update};

const TABLE: &str = "settings";

#[automock]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The settings row; defaults when it has never been written.
    async fn get(&self) -> Result<Settings, RepositoryError>;

    /// Set one logo URL (empty to remove), creating the row if needed.
    async fn set_logo(&self, kind: LogoKind, url: &str) -> Result<(), RepositoryError>;
}

/// Settings repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestSettingsRepository {
    client: BackendClient,
}

impl RestSettingsRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsRepository for RestSettingsRepository {
    async fn get(&self) -> Result<Settings, RepositoryError> {
        let row: Option<Settings> = self
            .client
            .table(TABLE)
            .select("*")
            .eq("id", SETTINGS_ROW_ID)
            .fetch_optional()
            .await?;
        Ok(row.unwrap_or_default())
    }

    async fn set_logo(&self, kind: LogoKind, url: &str) -> Result<(), RepositoryError> {
        let _: Vec<Settings> = self
            .client
            .table(TABLE)
            .upsert(&logo_update(kind, url))
            .await?;
        Ok(())
    }
}
