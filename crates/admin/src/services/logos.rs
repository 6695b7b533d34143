//! Header, footer, and admin logos.

use std::sync::Arc;

use thiserror::Error;

use super::images::{ImageStore, ImageUpload, unix_millis};
use super::notifications::Notifier;
use crate::backend::{BackendError, UploadOptions};
use crate::db::{RepositoryError, SettingsRepository};
use crate::models::{LogoKind, Settings};

/// Storage bucket for logos.
pub const LOGOS_BUCKET: &str = "logos";
/// Browser cache lifetime for uploaded logos, in seconds.
const LOGO_CACHE_SECONDS: u32 = 3600;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no file selected")]
    NoFile,

    #[error("upload failed: {0}")]
    Upload(#[from] BackendError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Uploads logos and records their public URLs in the settings row.
#[derive(Clone)]
pub struct LogoService {
    settings: Arc<dyn SettingsRepository>,
    images: Arc<dyn ImageStore>,
    notifier: Notifier,
}

impl LogoService {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsRepository>, images: Arc<dyn ImageStore>, notifier: Notifier) -> Self {
        Self {
            settings,
            images,
            notifier,
        }
    }

    /// The settings row; empty on failure.
    pub async fn current(&self) -> Settings {
        self.settings.get().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load logos");
            self.notifier.error("Failed to load current logos");
            Settings::default()
        })
    }

    /// Upload `image` as the `kind` logo and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoFile` for an empty upload, otherwise the
    /// storage or repository error.
    pub async fn save(&self, kind: LogoKind, image: ImageUpload) -> Result<String, SettingsError> {
        if image.bytes.is_empty() {
            self.notifier.error("Please select a file to upload");
            return Err(SettingsError::NoFile);
        }

        match self.upload(kind, image).await {
            Ok(url) => {
                tracing::info!(logo = kind.column(), %url, "Logo saved");
                self.notifier.success("Logo saved successfully");
                Ok(url)
            }
            Err(e) => {
                tracing::error!(logo = kind.column(), error = %e, "Failed to save logo");
                self.notifier.error("Failed to save logo");
                Err(e)
            }
        }
    }

    async fn upload(&self, kind: LogoKind, image: ImageUpload) -> Result<String, SettingsError> {
        let path = format!("{}/{}.{}", kind.column(), unix_millis(), image.extension());
        let options = UploadOptions {
            content_type: image.content_type.clone(),
            upsert: true,
            cache_control: Some(LOGO_CACHE_SECONDS),
        };
        let stored = self.images.upload(LOGOS_BUCKET, &path, image.bytes, &options).await?;
        let url = self.images.public_url(LOGOS_BUCKET, &stored)?;
        self.settings.set_logo(kind, &url).await?;
        Ok(url)
    }

    /// Clear the `kind` logo. The stored object is kept.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn remove(&self, kind: LogoKind) -> Result<(), SettingsError> {
        match self.settings.set_logo(kind, "").await {
            Ok(()) => {
                self.notifier.success("Logo removed successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(logo = kind.column(), error = %e, "Failed to remove logo");
                self.notifier.error("Failed to remove logo");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for LogoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoService").finish_non_exhaustive()
    }
}
