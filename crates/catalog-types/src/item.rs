//! Catalog item and search result types.
//!
//! A `CatalogItem` is one installable script after validation and slug
//! assignment. It is the unit the cache stores under its own key.

use serde::{Deserialize, Serialize};

/// Descriptions are cut to this many characters when parsed.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// One installable script from the upstream catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Display name (trimmed)
    pub name: String,

    /// Stable identifier, unique within one refresh
    pub slug: String,

    /// Free-text description, at most [`MAX_DESCRIPTION_CHARS`] characters
    #[serde(default)]
    pub description: String,

    /// Name of the category the script was listed under
    #[serde(default)]
    pub category: String,

    /// Upstream script type (`ct`, `vm`, `addon`, ...), empty when absent
    #[serde(default, rename = "type")]
    pub script_type: String,

    /// Disabled scripts are cached but never returned by search
    #[serde(default)]
    pub disabled: bool,

    /// Public page for this script
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl CatalogItem {
    /// Create an enabled item with the given name, slug and description.
    ///
    /// The description is truncated to [`MAX_DESCRIPTION_CHARS`].
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: truncate_chars(&description.into(), MAX_DESCRIPTION_CHARS),
            category: String::new(),
            script_type: String::new(),
            disabled: false,
            url: String::new(),
            website: None,
            documentation: None,
            logo: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Truncate `s` to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// A ranked search result as returned across the plugin boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    /// Description snippet (may be shortened for display)
    pub description: String,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_truncates_description() {
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 20);
        let item = CatalogItem::new("Name", "name", long);
        assert_eq!(item.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let s = "äöü".repeat(300);
        let cut = truncate_chars(&s, MAX_DESCRIPTION_CHARS);
        assert_eq!(cut.chars().count(), MAX_DESCRIPTION_CHARS);
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_serde_uses_upstream_type_field() {
        let mut item = CatalogItem::new("Docker", "docker", "Container runtime");
        item.script_type = "ct".to_string();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "ct");
        assert!(json.get("website").is_none());

        let decoded: CatalogItem = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, item);
    }
}
