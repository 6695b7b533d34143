//! Content blocks: editable page text stored by slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// Slug of the application-name block.
pub const APPLICATION_NAME_SLUG: &str = "application-name";
/// Shown until an application name is saved.
pub const DEFAULT_APPLICATION_NAME: &str = "Frame Ji";
/// Slug of the social-links block.
pub const SOCIAL_LINKS_SLUG: &str = "social-links";

/// A row of the `content` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pages edited as raw HTML/text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentPage {
    PrivacyPolicy,
    Terms,
    RefundPolicy,
    ShippingPolicy,
    AboutUs,
}

impl ContentPage {
    pub const ALL: [Self; 5] = [
        Self::PrivacyPolicy,
        Self::Terms,
        Self::RefundPolicy,
        Self::ShippingPolicy,
        Self::AboutUs,
    ];

    /// Block id in the `content` table, also the URL segment.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "privacy-policy",
            Self::Terms => "terms",
            Self::RefundPolicy => "refund-policy",
            Self::ShippingPolicy => "shipping-policy",
            Self::AboutUs => "about-us",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "Privacy Policy",
            Self::Terms => "Terms and Conditions",
            Self::RefundPolicy => "Refund Policy",
            Self::ShippingPolicy => "Shipping Policy",
            Self::AboutUs => "About Us",
        }
    }

    /// Text shown when the block has never been saved.
    #[must_use]
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => include_str!("../../content/privacy-policy.txt"),
            Self::Terms => include_str!("../../content/terms.txt"),
            Self::RefundPolicy => include_str!("../../content/refund-policy.txt"),
            Self::ShippingPolicy => include_str!("../../content/shipping-policy.txt"),
            Self::AboutUs => include_str!("../../content/about-us.txt"),
        }
    }

    #[must_use]
    pub const fn saved_message(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "Privacy policy saved successfully",
            Self::Terms => "Terms saved successfully",
            Self::RefundPolicy => "Refund policy saved successfully",
            Self::ShippingPolicy => "Shipping policy saved successfully",
            Self::AboutUs => "About Us content saved successfully",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.slug() == slug)
    }
}

/// Social network profile URLs, stored as JSON text in one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub x: String,
    pub instagram: String,
    pub youtube: String,
    pub linkedin: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            facebook: "https://www.facebook.com/".to_string(),
            x: "https://x.com/".to_string(),
            instagram: "https://www.instagram.com/".to_string(),
            youtube: "https://www.youtube.com/".to_string(),
            linkedin: "https://in.linkedin.com/".to_string(),
        }
    }
}

impl SocialLinks {
    /// Parse the stored block; unparseable text yields the defaults.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored social links are not valid JSON");
            Self::default()
        })
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_content(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Columns written when a block is created.
#[derive(Debug, Serialize)]
pub struct NewContentRecord<'a> {
    pub id: &'a str,
    pub content: &'a str,
    pub updated_at: DateTime<Utc>,
}

/// Columns written when a block is updated.
#[derive(Debug, Serialize)]
pub struct ContentUpdate<'a> {
    pub content: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_round_trip() {
        for page in ContentPage::ALL {
            assert_eq!(ContentPage::from_slug(page.slug()), Some(page));
            assert!(!page.default_text().trim().is_empty());
        }
        assert_eq!(ContentPage::from_slug("cookie-policy"), None);
    }

    #[test]
    fn test_default_texts_name_their_page() {
        assert!(ContentPage::PrivacyPolicy.default_text().starts_with("Privacy Policy"));
        assert!(ContentPage::Terms.default_text().contains("Terms and Conditions"));
    }

    #[test]
    fn test_social_links_partial_json_keeps_defaults() {
        let links = SocialLinks::from_content(r#"{"x":"https://x.com/neonflake"}"#);
        assert_eq!(links.x, "https://x.com/neonflake");
        assert_eq!(links.facebook, "https://www.facebook.com/");
    }

    #[test]
    fn test_social_links_invalid_json_falls_back() {
        assert_eq!(SocialLinks::from_content("not json"), SocialLinks::default());
    }
}
