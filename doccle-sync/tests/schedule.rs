use doccle_sync::schedule::run_schedule;
use doccle_sync_core::config::SynchroniseConfig;
use doccle_sync_core::contract::{MockDocumentSource, MockIngestor};
use doccle_sync_core::runner::SyncRunner;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn counting_runner(dir: &std::path::Path, listings: Arc<AtomicUsize>) -> Arc<SyncRunner> {
    let mut source = MockDocumentSource::new();
    source.expect_list_documents().returning(move |only_new, _| {
        assert!(only_new);
        listings.fetch_add(1, Ordering::SeqCst);
        Some(Vec::new())
    });
    let mut ingestor = MockIngestor::new();
    ingestor.expect_ingest().never();

    Arc::new(SyncRunner::new(
        SynchroniseConfig {
            download_dir: dir.to_path_buf(),
            max_documents: None,
        },
        Arc::new(source),
        Arc::new(ingestor),
    ))
}

#[tokio::test]
async fn test_first_cycle_runs_immediately() {
    let dir = tempdir().unwrap();
    let listings = Arc::new(AtomicUsize::new(0));
    let runner = counting_runner(dir.path(), listings.clone());

    let _ = tokio::time::timeout(
        Duration::from_millis(200),
        run_schedule(runner.clone(), Duration::from_secs(3600)),
    )
    .await;

    assert_eq!(listings.load(Ordering::SeqCst), 1);
    assert!(runner.last_run().is_some());
}

#[tokio::test]
async fn test_cycles_repeat_on_the_interval() {
    let dir = tempdir().unwrap();
    let listings = Arc::new(AtomicUsize::new(0));
    let runner = counting_runner(dir.path(), listings.clone());

    let _ = tokio::time::timeout(
        Duration::from_millis(550),
        run_schedule(runner, Duration::from_millis(100)),
    )
    .await;

    let runs = listings.load(Ordering::SeqCst);
    assert!(runs >= 3, "expected several cycles, got {runs}");
}
