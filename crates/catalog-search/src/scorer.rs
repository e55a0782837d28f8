//! AND-logic keyword scoring.

use tracing::debug;

use catalog_types::{CatalogItem, SearchHit};

use crate::snippet::snippet;

/// Score added when a query word occurs in the item name.
pub const NAME_WEIGHT: u32 = 10;

/// Score added when a query word occurs in the item description.
pub const DESCRIPTION_WEIGHT: u32 = 5;

/// Result cap when none is configured.
pub const DEFAULT_LIMIT: usize = 20;

/// Options for a search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum results to return
    pub limit: usize,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// An item that matched every query word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredItem<'a> {
    pub item: &'a CatalogItem,
    pub score: u32,
}

impl ScoredItem<'_> {
    /// Convert to the host-facing result shape.
    pub fn to_hit(&self) -> SearchHit {
        SearchHit {
            title: self.item.name.clone(),
            url: self.item.url.clone(),
            description: snippet(&self.item.description),
            score: self.score,
        }
    }
}

/// Rank `items` against `query`.
///
/// Results are ordered by score, highest first; equal scores keep the
/// order of `items`. An empty or whitespace-only query matches nothing.
pub fn search<'a>(
    query: &str,
    items: &'a [CatalogItem],
    options: &SearchOptions,
) -> Vec<ScoredItem<'a>> {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() || options.limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredItem<'a>> = items
        .iter()
        .filter(|item| !item.disabled)
        .filter_map(|item| score_item(&words, item).map(|score| ScoredItem { item, score }))
        .collect();

    // stable: ties keep input order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(options.limit);

    debug!(query, words = words.len(), hits = scored.len(), "Scored catalog");
    scored
}

/// `None` when any word matches neither name nor description.
fn score_item(words: &[String], item: &CatalogItem) -> Option<u32> {
    let name = item.name.to_lowercase();
    let description = item.description.to_lowercase();

    let mut total = 0;
    for word in words {
        let mut word_score = 0;
        if name.contains(word.as_str()) {
            word_score += NAME_WEIGHT;
        }
        if description.contains(word.as_str()) {
            word_score += DESCRIPTION_WEIGHT;
        }
        if word_score == 0 {
            return None;
        }
        total += word_score;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("Docker", "docker", "Container runtime for LXC"),
            CatalogItem::new(
                "Nginx Proxy Manager",
                "nginxproxymanager",
                "Reverse proxy with a web UI and Let's Encrypt",
            ),
            CatalogItem::new("Caddy", "caddy", "Fast reverse proxy server with automatic HTTPS"),
            CatalogItem::new("Portainer", "portainer", "Manage Docker containers"),
            CatalogItem::new("Legacy Docker", "legacy-docker", "Old docker build")
                .with_disabled(true),
        ]
    }

    fn names<'a>(results: &[ScoredItem<'a>]) -> Vec<&'a str> {
        results.iter().map(|r| r.item.name.as_str()).collect()
    }

    #[test]
    fn test_single_word() {
        let items = catalog();
        let results = search("docker", &items, &SearchOptions::new());

        assert_eq!(names(&results), vec!["Docker", "Portainer"]);
        assert_eq!(results[0].score, NAME_WEIGHT);
        assert_eq!(results[1].score, DESCRIPTION_WEIGHT);
    }

    #[test]
    fn test_and_logic() {
        let items = catalog();
        let results = search("reverse proxy", &items, &SearchOptions::new());

        // Nginx: reverse(desc 5) + proxy(name 10 + desc 5); Caddy: 5 + 5
        assert_eq!(names(&results), vec!["Nginx Proxy Manager", "Caddy"]);
        assert_eq!(results[0].score, 20);
        assert_eq!(results[1].score, 10);

        assert!(search("docker proxy", &items, &SearchOptions::new()).is_empty());
    }

    #[test]
    fn test_no_match_and_empty_query() {
        let items = catalog();
        assert!(search("xyznonexistent", &items, &SearchOptions::new()).is_empty());
        assert!(search("", &items, &SearchOptions::new()).is_empty());
        assert!(search("   \t ", &items, &SearchOptions::new()).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let items = catalog();
        let results = search("DOCKER", &items, &SearchOptions::new());
        assert_eq!(names(&results), vec!["Docker", "Portainer"]);
    }

    #[test]
    fn test_disabled_excluded() {
        let items = catalog();
        let results = search("legacy", &items, &SearchOptions::new());
        assert!(results.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items = vec![
            CatalogItem::new("Alpha Tool", "alpha", ""),
            CatalogItem::new("Beta Tool", "beta", ""),
            CatalogItem::new("Gamma Tool", "gamma", ""),
        ];
        let results = search("tool", &items, &SearchOptions::new());
        assert_eq!(names(&results), vec!["Alpha Tool", "Beta Tool", "Gamma Tool"]);
    }

    #[test]
    fn test_limit() {
        let items: Vec<CatalogItem> = (0..30)
            .map(|i| CatalogItem::new(format!("Tool {}", i), format!("tool-{}", i), ""))
            .collect();

        assert_eq!(search("tool", &items, &SearchOptions::new()).len(), DEFAULT_LIMIT);
        assert_eq!(
            search("tool", &items, &SearchOptions::new().with_limit(3)).len(),
            3
        );
        assert!(search("tool", &items, &SearchOptions::new().with_limit(0)).is_empty());
    }

    #[test]
    fn test_to_hit_uses_snippet() {
        let item = CatalogItem::new("Long", "long", "lorem ipsum ".repeat(40))
            .with_url("https://example.test/scripts?id=long");
        let items = vec![item];
        let hit = search("long", &items, &SearchOptions::new())[0].to_hit();

        assert_eq!(hit.title, "Long");
        assert_eq!(hit.url, "https://example.test/scripts?id=long");
        assert!(hit.description.ends_with("..."));
        assert_eq!(hit.score, NAME_WEIGHT);
    }

    proptest! {
        #[test]
        fn prop_every_result_matches_every_word(query in "[a-z ]{0,12}") {
            let items = catalog();
            let words: Vec<String> = query.split_whitespace().map(str::to_string).collect();
            for result in search(&query, &items, &SearchOptions::new()) {
                let haystack = format!(
                    "{} {}",
                    result.item.name.to_lowercase(),
                    result.item.description.to_lowercase()
                );
                prop_assert!(!result.item.disabled);
                prop_assert!(words.iter().all(|w| haystack.contains(w.as_str())));
            }
        }
    }
}
