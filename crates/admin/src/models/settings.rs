//! Site settings: the single `settings` row holding logo URLs.

use serde::{Deserialize, Serialize};

/// Primary key of the only settings row.
pub const SETTINGS_ROW_ID: i64 = 1;

/// The `settings` row. Empty strings mean "no logo".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "headerLogo", default)]
    pub header_logo: Option<String>,
    #[serde(rename = "footerLogo", default)]
    pub footer_logo: Option<String>,
    #[serde(rename = "adminLogo", default)]
    pub admin_logo: Option<String>,
}

impl Settings {
    /// Current URL for `kind`, if one is set.
    #[must_use]
    pub fn logo(&self, kind: LogoKind) -> Option<&str> {
        let url = match kind {
            LogoKind::Header => &self.header_logo,
            LogoKind::Footer => &self.footer_logo,
            LogoKind::Admin => &self.admin_logo,
        };
        url.as_deref().filter(|u| !u.is_empty())
    }
}

/// The three logo slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoKind {
    Header,
    Footer,
    Admin,
}

impl LogoKind {
    pub const ALL: [Self; 3] = [Self::Header, Self::Footer, Self::Admin];

    /// Settings column, storage folder, and URL segment.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Header => "headerLogo",
            Self::Footer => "footerLogo",
            Self::Admin => "adminLogo",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Header => "Header Logo",
            Self::Footer => "Footer Logo",
            Self::Admin => "Admin Logo",
        }
    }

    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.column() == column)
    }
}

/// Upsert body setting one logo column.
#[must_use]
pub fn logo_update(kind: LogoKind, url: &str) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("id".to_string(), SETTINGS_ROW_ID.into());
    body.insert(kind.column().to_string(), url.into());
    serde_json::Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_row_deserializes_camel_case_columns() {
        let settings: Settings = serde_json::from_str(
            r#"{"id":1,"headerLogo":"https://cdn/h.png","footerLogo":"","adminLogo":null}"#,
        )
        .unwrap();
        assert_eq!(settings.logo(LogoKind::Header), Some("https://cdn/h.png"));
        assert_eq!(settings.logo(LogoKind::Footer), None);
        assert_eq!(settings.logo(LogoKind::Admin), None);
    }

    #[test]
    fn test_logo_update_sets_single_column() {
        assert_eq!(
            logo_update(LogoKind::Footer, ""),
            serde_json::json!({"id": 1, "footerLogo": ""})
        );
        assert_eq!(LogoKind::from_column("adminLogo"), Some(LogoKind::Admin));
    }
}
