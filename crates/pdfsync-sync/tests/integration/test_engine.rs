//! Per-file decision tests for SyncEngine

use std::sync::Arc;

use tempfile::TempDir;

use pdfsync_core::domain::{FailureKind, Manifest, RemoteFile, SyncOutcome};
use pdfsync_sync::validator::HTML_REDIRECT_MESSAGE;
use pdfsync_sync::{SyncEngine, SyncOptions};

use crate::common::{html_bytes, id, pdf_bytes, test_config, FakeRemote};

const FOLDER: &str = "folderA";
const LABEL: &str = "inbox";

fn setup() -> (TempDir, Arc<FakeRemote>, SyncEngine) {
    let dir = TempDir::new().unwrap();
    let remote = FakeRemote::new();
    let config = test_config(&dir, &[(LABEL, FOLDER)]);
    let engine = SyncEngine::from_config(remote.clone(), &config);
    (dir, remote, engine)
}

fn remote_file(file_id: &str, name: &str) -> RemoteFile {
    RemoteFile::new(id(file_id), name)
}

const NO_FORCE: SyncOptions = SyncOptions { force: false };
const FORCE: SyncOptions = SyncOptions { force: true };

// ============================================================================
// Success and rejection
// ============================================================================

#[tokio::test]
async fn test_valid_pdf_is_recorded_as_success() {
    let (dir, remote, engine) = setup();
    remote.add_file(FOLDER, "a", "a.pdf", pdf_bytes(2000));
    let mut manifest = Manifest::new();

    let outcome = engine
        .sync_one(&remote_file("a", "a.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;

    let expected_path = dir.path().join("out").join(LABEL).join("a.pdf");
    assert_eq!(
        outcome,
        SyncOutcome::Success {
            local_path: expected_path.clone(),
            size: 2000
        }
    );
    let entry = manifest.processed_entry(&id("a")).unwrap();
    assert!(entry.is_valid());
    assert_eq!(entry.local_path, expected_path);
    assert_eq!(entry.size, 2000);
    assert!(manifest.errors().is_empty());
    assert_eq!(std::fs::read(&expected_path).unwrap(), pdf_bytes(2000));
}

#[tokio::test]
async fn test_html_download_is_quarantined() {
    let (dir, remote, engine) = setup();
    remote.add_file(FOLDER, "b", "b.pdf", html_bytes());
    let mut manifest = Manifest::new();

    let outcome = engine
        .sync_one(&remote_file("b", "b.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;

    let primary = dir.path().join("out").join(LABEL).join("b.pdf");
    let quarantined = dir.path().join("out").join(LABEL).join("_invalid").join("b.pdf");
    let SyncOutcome::Invalid { errors, moved_to } = &outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(moved_to.as_ref(), Some(&quarantined));
    assert!(errors.iter().any(|e| e.starts_with("Invalid PDF header")));
    assert!(errors.iter().any(|e| e == HTML_REDIRECT_MESSAGE));

    assert!(!primary.exists());
    assert_eq!(std::fs::read(&quarantined).unwrap(), html_bytes());

    let entry = manifest.error_entry(&id("b")).unwrap();
    assert_eq!(entry.kind, Some(FailureKind::Validation));
    assert_eq!(entry.moved_to.as_ref(), Some(&quarantined));
    assert!(entry.error.contains("Invalid PDF header"));
    assert!(entry.error.contains(HTML_REDIRECT_MESSAGE));
    assert!(manifest.processed_entry(&id("b")).is_none());
}

#[tokio::test]
async fn test_repeated_rejection_keeps_every_quarantined_copy() {
    let (dir, remote, engine) = setup();
    let mut first = html_bytes();
    first.extend_from_slice(b"FIRST");
    let mut second = html_bytes();
    second.extend_from_slice(b"SECOND");
    remote.add_file(FOLDER, "b", "b.pdf", first.clone());
    let mut manifest = Manifest::new();
    let file = remote_file("b", "b.pdf");

    let outcome1 = engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    remote.set_content("b", second.clone());
    let outcome2 = engine.sync_one(&file, LABEL, &mut manifest, FORCE).await;

    let quarantine = dir.path().join("out").join(LABEL).join("_invalid");
    let SyncOutcome::Invalid { moved_to: Some(q1), .. } = &outcome1 else {
        panic!("expected quarantined Invalid, got {outcome1:?}");
    };
    let SyncOutcome::Invalid { moved_to: Some(q2), .. } = &outcome2 else {
        panic!("expected quarantined Invalid, got {outcome2:?}");
    };
    assert_eq!(q1, &quarantine.join("b.pdf"));
    assert_eq!(q2, &quarantine.join("b (1).pdf"));
    assert_eq!(std::fs::read(q1).unwrap(), first);
    assert_eq!(std::fs::read(q2).unwrap(), second);
    assert_eq!(std::fs::read_dir(&quarantine).unwrap().count(), 2);
    assert_eq!(
        manifest.error_entry(&id("b")).unwrap().moved_to.as_ref(),
        Some(q2)
    );
}

#[tokio::test]
async fn test_unusable_quarantine_dir_sets_file_aside_in_place() {
    let (dir, remote, engine) = setup();
    let inbox = dir.path().join("out").join(LABEL);
    std::fs::create_dir_all(&inbox).unwrap();
    // A plain file where the quarantine directory should go
    std::fs::write(inbox.join("_invalid"), b"not a directory").unwrap();
    remote.add_file(FOLDER, "b", "b.pdf", html_bytes());
    let mut manifest = Manifest::new();

    let outcome = engine
        .sync_one(&remote_file("b", "b.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;

    let set_aside = inbox.join("b.pdf.invalid");
    let SyncOutcome::Invalid { moved_to, .. } = &outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(moved_to.as_ref(), Some(&set_aside));
    assert!(!inbox.join("b.pdf").exists());
    assert_eq!(std::fs::read(&set_aside).unwrap(), html_bytes());

    let entry = manifest.error_entry(&id("b")).unwrap();
    assert_eq!(entry.kind, Some(FailureKind::Validation));
    assert_eq!(entry.moved_to.as_ref(), Some(&set_aside));
}

#[tokio::test]
async fn test_size_boundary() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "min", "min.pdf", pdf_bytes(1024));
    remote.add_file(FOLDER, "short", "short.pdf", pdf_bytes(1023));
    let mut manifest = Manifest::new();

    let at_min = engine
        .sync_one(&remote_file("min", "min.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;
    let below = engine
        .sync_one(&remote_file("short", "short.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;

    assert!(matches!(at_min, SyncOutcome::Success { .. }));
    assert!(matches!(below, SyncOutcome::Invalid { .. }));
}

#[tokio::test]
async fn test_transfer_failure_leaves_no_local_file() {
    let (dir, remote, engine) = setup();
    remote.add_file(FOLDER, "c", "c.pdf", pdf_bytes(2000));
    remote.fail_content("c", "HTTP 500: backend error");
    let mut manifest = Manifest::new();

    let outcome = engine
        .sync_one(&remote_file("c", "c.pdf"), LABEL, &mut manifest, NO_FORCE)
        .await;

    assert!(matches!(outcome, SyncOutcome::TransferError { .. }));
    let entry = manifest.error_entry(&id("c")).unwrap();
    assert_eq!(entry.kind, Some(FailureKind::Transfer));
    assert!(entry.error.contains("HTTP 500"));
    assert!(entry.moved_to.is_none());
    assert!(!dir.path().join("out").join(LABEL).join("c.pdf").exists());
}

// ============================================================================
// Skips
// ============================================================================

#[tokio::test]
async fn test_processed_file_is_skipped_without_download() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "a", "a.pdf", pdf_bytes(2000));
    let mut manifest = Manifest::new();
    let file = remote_file("a", "a.pdf");

    engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    let before = manifest.clone();
    let outcome = engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;

    assert_eq!(outcome, SyncOutcome::Skipped);
    assert_eq!(remote.downloads_of("a"), 1);
    assert_eq!(manifest, before);
}

#[tokio::test]
async fn test_deleted_local_copy_is_downloaded_again() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "a", "a.pdf", pdf_bytes(2000));
    let mut manifest = Manifest::new();
    let file = remote_file("a", "a.pdf");

    let SyncOutcome::Success { local_path, .. } =
        engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await
    else {
        panic!("first sync should succeed");
    };
    std::fs::remove_file(&local_path).unwrap();

    let outcome = engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;

    assert!(matches!(outcome, SyncOutcome::Success { .. }));
    assert_eq!(remote.downloads_of("a"), 2);
    assert!(local_path.exists());
}

#[tokio::test]
async fn test_failed_file_is_not_downloaded_again() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "b", "b.pdf", html_bytes());
    let mut manifest = Manifest::new();
    let file = remote_file("b", "b.pdf");

    engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    let recorded = manifest.error_entry(&id("b")).unwrap().error.clone();
    let outcome = engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;

    assert_eq!(outcome, SyncOutcome::SkippedError { message: recorded });
    assert_eq!(remote.downloads_of("b"), 1);
}

// ============================================================================
// Force and recovery
// ============================================================================

#[tokio::test]
async fn test_force_redownloads_processed_file() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "a", "a.pdf", pdf_bytes(2000));
    let mut manifest = Manifest::new();
    let file = remote_file("a", "a.pdf");

    engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    let outcome = engine.sync_one(&file, LABEL, &mut manifest, FORCE).await;

    assert!(matches!(outcome, SyncOutcome::Success { .. }));
    assert_eq!(remote.downloads_of("a"), 2);
}

#[tokio::test]
async fn test_forced_retry_that_succeeds_clears_error() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "b", "b.pdf", html_bytes());
    let mut manifest = Manifest::new();
    let file = remote_file("b", "b.pdf");

    engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    assert!(manifest.error_entry(&id("b")).is_some());

    remote.set_content("b", pdf_bytes(4096));
    let outcome = engine.sync_one(&file, LABEL, &mut manifest, FORCE).await;

    assert!(matches!(outcome, SyncOutcome::Success { size: 4096, .. }));
    assert!(manifest.error_entry(&id("b")).is_none());
    assert!(manifest.is_processed_valid(&id("b")));
    assert!(manifest.is_consistent());
}

#[tokio::test]
async fn test_forced_retry_that_fails_replaces_success() {
    let (_dir, remote, engine) = setup();
    remote.add_file(FOLDER, "a", "a.pdf", pdf_bytes(2000));
    let mut manifest = Manifest::new();
    let file = remote_file("a", "a.pdf");

    engine.sync_one(&file, LABEL, &mut manifest, NO_FORCE).await;
    remote.fail_content("a", "connection reset by peer");
    let outcome = engine.sync_one(&file, LABEL, &mut manifest, FORCE).await;

    assert!(matches!(outcome, SyncOutcome::TransferError { .. }));
    assert!(manifest.processed_entry(&id("a")).is_none());
    assert!(manifest.error_entry(&id("a")).is_some());
    assert!(manifest.is_consistent());
}

// ============================================================================
// Validate-only checks
// ============================================================================

#[tokio::test]
async fn test_check_local_reports_without_transfer_or_mutation() {
    let (dir, remote, engine) = setup();
    let inbox = dir.path().join("out").join(LABEL);
    std::fs::create_dir_all(&inbox).unwrap();
    std::fs::write(inbox.join("good.pdf"), pdf_bytes(2000)).unwrap();
    std::fs::write(inbox.join("bad.pdf"), html_bytes()).unwrap();

    let good = engine.check_local(&remote_file("g", "good.pdf"), LABEL).await;
    let bad = engine.check_local(&remote_file("b", "bad.pdf"), LABEL).await;
    let missing = engine.check_local(&remote_file("m", "missing.pdf"), LABEL).await;

    assert_eq!(good.label(), "valid");
    assert_eq!(bad.label(), "invalid");
    assert_eq!(missing.label(), "missing");
    assert_eq!(remote.download_count(), 0);
    // Invalid local copies are reported, not quarantined
    assert!(inbox.join("bad.pdf").exists());
}
