//! End-to-end runs of the sync service against in-memory systems
mod common;

use std::sync::Arc;

use common::{MemoryCatalog, MemoryStore, source_show, stored_show};
use show_sync_lib::application::{SyncService, build_index};
use show_sync_lib::infrastructure::config::AppConfig;
use show_sync_lib::infrastructure::sync_error::SyncError;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.source.max_page = 50;
    config.workers.count = 3;
    config.retry.max_attempts = 3;
    config.retry.initial_delay_ms = 1;
    config.retry.max_delay_ms = 4;
    config.destination.index_fetch_concurrency = 2;
    config
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new(vec![
        vec![source_show(1, "One"), source_show(2, "Two")],
        vec![source_show(3, "Three"), source_show(4, "Four")],
        vec![source_show(5, "Five")],
    ])
}

#[tokio::test]
async fn second_run_issues_no_writes() {
    let store = Arc::new(MemoryStore::with_shows(vec![stored_show(1, "One (old)")]));
    let service = SyncService::new(test_config(), Arc::new(catalog()), store.clone());

    let first = service.run().await.unwrap();
    assert_eq!(first.created, 4);
    assert_eq!(first.updated, 1);
    assert_eq!(store.write_count(), 5);

    store.reset_calls();
    let second = service.run().await.unwrap();
    assert_eq!(second.writes(), 0);
    assert_eq!(second.unchanged, 5);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.uploads.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exact_multiple_of_page_size_reads_one_extra_page() {
    let shows: Vec<_> = (1..=250).map(|id| stored_show(id, &format!("Show {id}"))).collect();
    let store = MemoryStore::with_shows(shows);

    let index = build_index(&store, 4).await.unwrap();

    assert_eq!(index.len(), 250);
    let mut pages = store.page_requests.lock().unwrap().clone();
    pages.sort_unstable();
    assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn failing_index_page_aborts_the_run() {
    let shows: Vec<_> = (1..=10).map(|id| stored_show(id, "x")).collect();
    let store = Arc::new(MemoryStore {
        page_size: 4,
        failing_pages: [2].into_iter().collect(),
        ..MemoryStore::with_shows(shows)
    });
    let source = Arc::new(catalog());
    let service = SyncService::new(test_config(), source.clone(), store.clone());

    let err = service.run().await.unwrap_err();

    assert!(matches!(err, SyncError::IndexBuild { page: 2, .. }));
    assert_eq!(source.requested_pages(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn failing_source_page_is_skipped() {
    let source = Arc::new(MemoryCatalog {
        failing_pages: [1].into_iter().collect(),
        ..catalog()
    });
    let store = Arc::new(MemoryStore::with_shows(Vec::new()));
    let service = SyncService::new(test_config(), source.clone(), store.clone());

    let summary = service.run().await.unwrap();

    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.failed_pages[0].0, 1);
    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.created, 3);
    assert_eq!(source.requests_for(1), 3);
}

#[tokio::test]
async fn paging_stops_at_end_of_data() {
    let source = Arc::new(catalog());
    let store = Arc::new(MemoryStore::with_shows(Vec::new()));
    let service = SyncService::new(test_config(), source.clone(), store);

    let summary = service.run().await.unwrap();

    assert_eq!(summary.pages_processed, 3);
    assert!(summary.pages_past_end >= 1);
    assert!(source.requested_pages() < 51);
    assert_eq!(source.requests_for(3), 1);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let mut config = test_config();
    config.dry_run = true;
    let store = Arc::new(MemoryStore::with_shows(vec![stored_show(2, "Two (old)")]));
    let service = SyncService::new(config, Arc::new(catalog()), store.clone());

    let summary = service.run().await.unwrap();

    assert_eq!(summary.created, 4);
    assert_eq!(summary.updated, 1);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.uploads.load(std::sync::atomic::Ordering::SeqCst), 0);
}
