//! Whole-run tests for Orchestrator

use std::sync::Arc;

use tempfile::TempDir;

use pdfsync_core::config::Config;
use pdfsync_core::domain::FailureKind;
use pdfsync_sync::{Orchestrator, RunOptions, RunStats};

use crate::common::{html_bytes, id, pdf_bytes, test_config, FakeRemote, MemoryStore, RecordingObserver};

struct Harness {
    _dir: TempDir,
    config: Config,
    remote: Arc<FakeRemote>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new(folders: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, folders);
        Self {
            _dir: dir,
            config,
            remote: FakeRemote::new(),
            store: MemoryStore::new(),
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(&self.config, self.remote.clone(), self.store.clone())
    }
}

fn sync_opts() -> RunOptions {
    RunOptions::default()
}

// ============================================================================
// Counting and persistence
// ============================================================================

#[tokio::test]
async fn test_run_counts_outcomes_and_saves_once() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());
    h.remote.add_file("folderA", "c", "c.pdf", pdf_bytes(2000));
    h.remote.fail_content("c", "HTTP 503: backend unavailable");

    let report = h.orchestrator().run(&sync_opts()).await.unwrap();

    assert_eq!(
        report.stats,
        RunStats {
            success: 1,
            invalid: 1,
            errors: 1,
            ..RunStats::default()
        }
    );
    assert!(report.manifest_saved);
    assert_eq!(h.store.save_count(), 1);

    let saved = h.store.saved();
    assert!(saved.last_sync().is_some());
    assert!(saved.is_processed_valid(&id("a")));
    assert!(saved.is_consistent());

    let mut reported: Vec<(String, Option<FailureKind>)> = report
        .errors
        .iter()
        .map(|e| (e.name.clone(), e.kind))
        .collect();
    reported.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        reported,
        vec![
            ("b.pdf".to_string(), Some(FailureKind::Validation)),
            ("c.pdf".to_string(), Some(FailureKind::Transfer)),
        ]
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());

    h.orchestrator().run(&sync_opts()).await.unwrap();
    let first = h.store.saved();
    let downloads = h.remote.download_count();

    let report = h.orchestrator().run(&sync_opts()).await.unwrap();
    let second = h.store.saved();

    assert_eq!(h.remote.download_count(), downloads);
    assert_eq!(report.stats.skipped, 2);
    assert_eq!(report.stats.success, 0);
    assert_eq!(first.processed(), second.processed());
    assert_eq!(first.errors(), second.errors());
    assert_eq!(first.archived(), second.archived());
    assert!(second.last_sync() >= first.last_sync());
}

#[tokio::test]
async fn test_report_lists_errors_from_earlier_runs() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());
    h.orchestrator().run(&sync_opts()).await.unwrap();

    let report = h.orchestrator().run(&sync_opts()).await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].id, id("b"));
    assert!(report.errors[0].moved_to.is_some());
}

#[tokio::test]
async fn test_force_run_retries_errors() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());
    h.orchestrator().run(&sync_opts()).await.unwrap();

    h.remote.set_content("b", pdf_bytes(2000));
    let report = h
        .orchestrator()
        .run(&RunOptions {
            force: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(report.stats.success, 1);
    assert!(report.errors.is_empty());
    assert!(h.store.saved().is_processed_valid(&id("b")));
}

#[tokio::test]
async fn test_retry_transfer_errors_setting() {
    let mut h = Harness::new(&[("inbox", "folderA")]);
    h.config.sync.retry_transfer_errors = true;
    h.remote.add_file("folderA", "c", "c.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());
    h.remote.fail_content("c", "timeout");
    h.orchestrator().run(&sync_opts()).await.unwrap();

    h.remote.set_content("c", pdf_bytes(2000));
    let report = h.orchestrator().run(&sync_opts()).await.unwrap();

    assert_eq!(h.remote.downloads_of("c"), 2);
    assert_eq!(h.remote.downloads_of("b"), 1);
    assert_eq!(report.stats.success, 1);
    assert_eq!(report.stats.skipped, 1);
}

// ============================================================================
// Folder handling
// ============================================================================

#[tokio::test]
async fn test_listing_failure_does_not_stop_other_folders() {
    let h = Harness::new(&[("broken", "folderX"), ("inbox", "folderA")]);
    h.remote.fail_listing("folderX");
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));

    let report = h.orchestrator().run(&sync_opts()).await.unwrap();

    assert_eq!(report.stats.folder_failures, 1);
    assert_eq!(report.stats.success, 1);
    assert_eq!(h.store.save_count(), 1);
}

#[tokio::test]
async fn test_folder_filter_restricts_run() {
    let h = Harness::new(&[("inbox", "folderA"), ("reports", "folderB")]);
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    h.remote.add_file("folderB", "r", "r.pdf", pdf_bytes(2000));

    let report = h
        .orchestrator()
        .run(&RunOptions {
            folders: vec!["reports".to_string()],
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(report.stats.success, 1);
    assert_eq!(h.remote.downloads_of("a"), 0);
    assert_eq!(h.remote.downloads_of("r"), 1);
}

#[tokio::test]
async fn test_unknown_folder_filter_is_rejected_before_any_work() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));

    let result = h
        .orchestrator()
        .run(&RunOptions {
            folders: vec!["nope".to_string()],
            ..RunOptions::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(h.remote.download_count(), 0);
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn test_unloadable_manifest_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[("inbox", "folderA")]);
    let remote = FakeRemote::new();
    remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    let store = MemoryStore::corrupt();

    let result = Orchestrator::new(&config, remote.clone(), store.clone())
        .run(&sync_opts())
        .await;

    assert!(result.is_err());
    assert_eq!(remote.download_count(), 0);
    assert_eq!(store.save_count(), 0);
}

// ============================================================================
// Validate-only
// ============================================================================

#[tokio::test]
async fn test_validate_only_neither_transfers_nor_saves() {
    let h = Harness::new(&[("inbox", "folderA")]);
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "b", "b.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "m", "m.pdf", pdf_bytes(2000));
    h.orchestrator().run(&sync_opts()).await.unwrap();
    let downloads = h.remote.download_count();
    let saved = h.store.saved();

    let inbox = h.config.output_dir().join("inbox");
    std::fs::write(inbox.join("b.pdf"), html_bytes()).unwrap();
    std::fs::remove_file(inbox.join("m.pdf")).unwrap();

    let report = h
        .orchestrator()
        .run(&RunOptions {
            validate_only: true,
            archive: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert!(report.validate_only);
    assert!(!report.manifest_saved);
    assert_eq!(report.stats.success, 1);
    assert_eq!(report.stats.invalid, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.archived, 0);
    assert_eq!(h.remote.download_count(), downloads);
    assert_eq!(h.store.save_count(), 1);
    assert_eq!(h.store.saved(), saved);
}

// ============================================================================
// Observer
// ============================================================================

#[tokio::test]
async fn test_observer_sees_every_outcome() {
    let h = Harness::new(&[("broken", "folderX"), ("inbox", "folderA")]);
    h.remote.fail_listing("folderX");
    h.remote.add_file("folderA", "a", "a.pdf", pdf_bytes(2000));
    h.remote.add_file("folderA", "b", "b.pdf", html_bytes());
    let observer = Arc::new(RecordingObserver::default());

    h.orchestrator()
        .with_observer(observer.clone())
        .run(&sync_opts())
        .await
        .unwrap();

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "failed broken".to_string(),
            "start inbox 2".to_string(),
            // newest first
            "inbox/b.pdf invalid".to_string(),
            "inbox/a.pdf success".to_string(),
        ]
    );
}
