//! Snapshot assembly: slugs and URLs for validated scripts.

use tracing::{debug, warn};

use catalog_types::CatalogItem;

use crate::slug::{assign_slugs, SlugRequest};
use crate::validate::{Rejection, ValidatedCatalog};

/// Items ready for caching, in catalog order, plus everything skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub rejected: Vec<Rejection>,
}

impl CatalogSnapshot {
    /// Slugs in catalog order.
    pub fn slugs(&self) -> Vec<String> {
        self.items.iter().map(|item| item.slug.clone()).collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.items.iter().filter(|item| !item.disabled).count()
    }
}

/// Assign slugs and derive item URLs.
///
/// `script_url` maps a final slug to the item's page URL. A script whose
/// slug source normalizes to nothing is rejected.
pub fn build_snapshot<F>(catalog: ValidatedCatalog, script_url: F) -> CatalogSnapshot
where
    F: Fn(&str) -> String,
{
    let ValidatedCatalog {
        scripts,
        mut rejected,
    } = catalog;

    let requests: Vec<SlugRequest<'_>> = scripts
        .iter()
        .map(|script| SlugRequest {
            source: &script.slug_source,
            enabled: !script.disabled,
        })
        .collect();
    let slugs = assign_slugs(&requests);

    let mut items = Vec::with_capacity(scripts.len());
    for (script, slug) in scripts.iter().zip(slugs) {
        let Some(slug) = slug else {
            warn!(name = %script.name, "Skipping script with empty slug");
            rejected.push(Rejection {
                category_index: script.category_index,
                script_index: Some(script.script_index),
                reason: format!("slug for {:?} is empty after normalization", script.name),
            });
            continue;
        };

        let url = script_url(&slug);
        let mut item = CatalogItem::new(&script.name, &slug, &script.description)
            .with_category(&script.category)
            .with_disabled(script.disabled)
            .with_url(url);
        item.script_type = script.script_type.clone();
        item.website = script.website.clone();
        item.documentation = script.documentation.clone();
        item.logo = script.logo.clone();
        items.push(item);
    }

    debug!(
        items = items.len(),
        rejected = rejected.len(),
        "Built catalog snapshot"
    );

    CatalogSnapshot { items, rejected }
}
