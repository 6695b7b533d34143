//! Content block seeding.

use neonflake_admin::backend::{BackendClient, BackendError};
use neonflake_admin::config::{BackendConfig, ConfigError};
use neonflake_admin::db::{ContentRepository, RepositoryError, RestContentRepository};
use neonflake_admin::models::{
    APPLICATION_NAME_SLUG, ContentPage, DEFAULT_APPLICATION_NAME, SOCIAL_LINKS_SLUG, SocialLinks,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to encode social links: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Slugs written and left alone by one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Default blocks: every content page, the application name, and the
/// social links.
///
/// # Errors
///
/// Returns error if the social links cannot be encoded.
pub fn default_blocks() -> Result<Vec<(String, String)>, serde_json::Error> {
    let mut blocks: Vec<(String, String)> = ContentPage::ALL
        .into_iter()
        .map(|page| (page.slug().to_string(), page.default_text().to_string()))
        .collect();
    blocks.push((APPLICATION_NAME_SLUG.to_string(), DEFAULT_APPLICATION_NAME.to_string()));
    blocks.push((SOCIAL_LINKS_SLUG.to_string(), SocialLinks::default().to_content()?));
    Ok(blocks)
}

/// Write each default block that is missing, or every block with `force`.
///
/// # Errors
///
/// Stops at the first repository error.
pub async fn seed_with(repo: &dyn ContentRepository, force: bool) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();
    for (slug, text) in default_blocks()? {
        if repo.exists(&slug).await? {
            if force {
                repo.update(&slug, &text).await?;
                tracing::info!(%slug, "Overwrote content block");
                report.written.push(slug);
            } else {
                tracing::debug!(%slug, "Content block exists, skipping");
                report.skipped.push(slug);
            }
        } else {
            repo.insert(&slug, &text).await?;
            tracing::info!(%slug, "Created content block");
            report.written.push(slug);
        }
    }
    Ok(report)
}

/// Seed content blocks using the service-role key.
///
/// # Errors
///
/// Returns error if `BACKEND_SERVICE_KEY` is missing or a write fails.
pub async fn seed(force: bool) -> Result<SeedReport, SeedError> {
    let config = BackendConfig::from_env()?;
    let client = BackendClient::with_service_role(&config)?;
    let repo = RestContentRepository::new(client);
    seed_with(&repo, force).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonflake_admin::db::MockContentRepository;
    use testresult::TestResult;

    #[tokio::test]
    async fn test_seed_skips_existing_blocks() -> TestResult {
        let mut repo = MockContentRepository::new();
        repo.expect_exists().returning(|slug| Ok(slug == "terms"));
        repo.expect_update().never();
        repo.expect_insert()
            .times(6)
            .withf(|slug, _| slug != "terms")
            .returning(|_, _| Ok(()));

        let report = seed_with(&repo, false).await?;
        assert_eq!(report.skipped, vec!["terms".to_string()]);
        assert_eq!(report.written.len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_force_overwrites_existing_blocks() -> TestResult {
        let mut repo = MockContentRepository::new();
        repo.expect_exists().returning(|_| Ok(true));
        repo.expect_insert().never();
        repo.expect_update()
            .times(7)
            .returning(|_, _| Ok(()));

        let report = seed_with(&repo, true).await?;
        assert!(report.skipped.is_empty());
        assert!(report.written.contains(&"social-links".to_string()));
        Ok(())
    }

    #[test]
    fn test_default_social_links_are_json() -> TestResult {
        let blocks = default_blocks()?;
        let (_, links) = blocks
            .iter()
            .find(|(slug, _)| slug == SOCIAL_LINKS_SLUG)
            .ok_or("social links block missing")?;
        assert!(links.contains("https://www.youtube.com/"));
        Ok(())
    }
}
