//! Editable content blocks: policy pages, application name, social links.

use std::sync::Arc;

use thiserror::Error;

use super::notifications::Notifier;
use crate::db::{ContentRepository, RepositoryError};
use crate::models::{
    APPLICATION_NAME_SLUG, ContentPage, DEFAULT_APPLICATION_NAME, SOCIAL_LINKS_SLUG, SocialLinks,
};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("failed to encode content: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Loads and saves content blocks.
#[derive(Clone)]
pub struct ContentService {
    content: Arc<dyn ContentRepository>,
    notifier: Notifier,
}

impl ContentService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentRepository>, notifier: Notifier) -> Self {
        Self { content, notifier }
    }

    /// Stored text for `page`, or its default text when none is stored or
    /// the load fails.
    pub async fn load_page(&self, page: ContentPage) -> String {
        match self.content.get(page.slug()).await {
            Ok(Some(block)) => block.content,
            Ok(None) => page.default_text().to_string(),
            Err(e) => {
                tracing::error!(slug = page.slug(), error = %e, "Failed to load content");
                self.notifier.error("Failed to load content");
                page.default_text().to_string()
            }
        }
    }

    /// Save `text` as the content of `page`.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn save_page(&self, page: ContentPage, text: &str) -> Result<(), ContentError> {
        match self.write(page.slug(), text).await {
            Ok(()) => {
                self.notifier.success(page.saved_message());
                Ok(())
            }
            Err(e) => {
                tracing::error!(slug = page.slug(), error = %e, "Failed to save content");
                self.notifier.error(format!(
                    "Failed to save {}. Please try again.",
                    page.title().to_lowercase()
                ));
                Err(e)
            }
        }
    }

    /// The configured application name, or the default.
    pub async fn application_name(&self) -> String {
        match self.content.get(APPLICATION_NAME_SLUG).await {
            Ok(Some(block)) if !block.content.trim().is_empty() => block.content,
            Ok(_) => DEFAULT_APPLICATION_NAME.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load application name");
                self.notifier.error("Failed to load application name");
                DEFAULT_APPLICATION_NAME.to_string()
            }
        }
    }

    /// Save a new application name; blank names are rejected.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Empty` for a blank name, otherwise the
    /// repository error.
    pub async fn save_application_name(&self, name: &str) -> Result<(), ContentError> {
        let name = name.trim();
        if name.is_empty() {
            self.notifier.error("Application name cannot be empty");
            return Err(ContentError::Empty("Application name"));
        }
        match self.write(APPLICATION_NAME_SLUG, name).await {
            Ok(()) => {
                self.notifier.success("Application name updated successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save application name");
                self.notifier.error("Failed to update application name");
                Err(e)
            }
        }
    }

    /// Stored social links, or the defaults.
    pub async fn social_links(&self) -> SocialLinks {
        match self.content.get(SOCIAL_LINKS_SLUG).await {
            Ok(Some(block)) => SocialLinks::from_content(&block.content),
            Ok(None) => SocialLinks::default(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load social links");
                self.notifier.error("Failed to load social links");
                SocialLinks::default()
            }
        }
    }

    /// Save all social links as one JSON block.
    ///
    /// # Errors
    ///
    /// Returns the encode or repository error after notifying.
    pub async fn save_social_links(&self, links: &SocialLinks) -> Result<(), ContentError> {
        let result = match links.to_content() {
            Ok(text) => self.write(SOCIAL_LINKS_SLUG, &text).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => {
                self.notifier.success("Social links updated successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save social links");
                self.notifier.error("Failed to update social links");
                Err(e)
            }
        }
    }

    /// Update the block if it exists, otherwise create it.
    async fn write(&self, slug: &str, text: &str) -> Result<(), ContentError> {
        if self.content.exists(slug).await? {
            self.content.update(slug, text).await?;
        } else {
            self.content.insert(slug, text).await?;
        }
        tracing::info!(slug, len = text.len(), "Content saved");
        Ok(())
    }
}

impl std::fmt::Debug for ContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService").finish_non_exhaustive()
    }
}
