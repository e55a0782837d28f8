//! Concurrent refreshes collapse into one upstream fetch.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use catalog_search::SearchOptions;
use catalog_service::RefreshOutcome;
use e2e_tests::{sample_catalog, TestHarness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_single_fetch() {
    let harness = Arc::new(TestHarness::new().await);
    harness
        .serve_catalog_slowly(&sample_catalog(), Duration::from_millis(300))
        .await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let harness = harness.clone();
            tokio::spawn(async move { harness.engine.refresh_if_stale().await })
        })
        .collect();

    let mut refreshed = 0;
    let mut in_progress = 0;
    for task in tasks {
        match task.await.unwrap() {
            RefreshOutcome::Refreshed { .. } => refreshed += 1,
            RefreshOutcome::InProgress => in_progress += 1,
            // a task scheduled after the winner finished sees a fresh cache
            RefreshOutcome::Fresh => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(refreshed, 1);
    assert!(in_progress <= 3);
    assert_eq!(harness.upstream_hits().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_search_during_refresh_uses_existing_entries() {
    let harness = Arc::new(TestHarness::new().await);
    harness.serve_catalog(&sample_catalog()).await;
    harness.engine.refresh_if_stale().await;

    harness
        .serve_catalog_slowly(&sample_catalog(), Duration::from_millis(500))
        .await;
    let refresher = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.engine.force_refresh().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.engine.is_refreshing());
    let hits = harness.engine.search("caddy", &SearchOptions::new());
    assert_eq!(hits.len(), 1);
    assert_eq!(harness.engine.force_refresh().await, RefreshOutcome::InProgress);

    assert!(matches!(
        refresher.await.unwrap(),
        RefreshOutcome::Refreshed { stored: 5, .. }
    ));
}
