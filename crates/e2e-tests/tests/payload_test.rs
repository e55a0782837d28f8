//! Partial payloads and slug assignment end to end.

use pretty_assertions::assert_eq;

use catalog_search::SearchOptions;
use catalog_service::RefreshOutcome;
use e2e_tests::TestHarness;

#[tokio::test]
async fn test_one_good_one_malformed_script() {
    let harness = TestHarness::new().await;
    harness
        .serve_catalog(&serde_json::json!([
            {"name": "Misc", "scripts": [
                {"name": "Valid Script", "slug": "valid-script", "description": "works"},
                {"name": ["not", "a", "string"], "slug": "broken"}
            ]},
            "not-a-category"
        ]))
        .await;

    let outcome = harness.engine.refresh_if_stale().await;
    assert_eq!(
        outcome,
        RefreshOutcome::Refreshed {
            stored: 1,
            skipped: 0,
            rejected: 2
        }
    );

    let hits = harness.engine.search("script", &SearchOptions::new());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Valid Script");
    assert_eq!(harness.engine.status().entries, 1);
}

#[tokio::test]
async fn test_enabled_item_keeps_bare_slug() {
    let harness = TestHarness::new().await;
    harness
        .serve_catalog(&serde_json::json!([
            {"name": "Network", "scripts": [
                {"name": "Pi-hole (legacy)", "slug": "pihole", "disable": true,
                 "description": "Old installer"},
                {"name": "Pi-hole", "slug": "pihole", "description": "Network-wide ad blocking"}
            ]}
        ]))
        .await;
    harness.engine.refresh_if_stale().await;

    let hits = harness.engine.search("pi-hole", &SearchOptions::new());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Pi-hole");
    assert_eq!(hits[0].url, "https://scripts.example.test/?id=pihole");

    let legacy = harness.engine.cache().get("pihole-1").unwrap().hit().unwrap();
    assert!(legacy.disabled);
}

#[tokio::test]
async fn test_unicode_names_get_ascii_slugs() {
    let harness = TestHarness::new().await;
    harness
        .serve_catalog(&serde_json::json!([
            {"scripts": [
                {"name": "Crème Brûlée Server"},
                {"name": "日本語"}
            ]}
        ]))
        .await;

    let outcome = harness.engine.refresh_if_stale().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Refreshed {
            stored: 1,
            rejected: 1,
            ..
        }
    ));
    let hits = harness.engine.search("crème", &SearchOptions::new());
    assert_eq!(hits[0].url, "https://scripts.example.test/?id=creme-brulee-server");
}

#[tokio::test]
async fn test_removed_script_leaves_snapshot() {
    let harness = TestHarness::new().await;
    harness
        .serve_catalog(&serde_json::json!([
            {"scripts": [{"name": "Docker"}, {"name": "Podman"}]}
        ]))
        .await;
    harness.engine.refresh_if_stale().await;

    harness
        .serve_catalog(&serde_json::json!([{"scripts": [{"name": "Docker"}]}]))
        .await;
    harness.engine.force_refresh().await;

    assert!(harness
        .engine
        .search("podman", &SearchOptions::new())
        .is_empty());
    assert_eq!(harness.engine.status().entries, 1);
}
