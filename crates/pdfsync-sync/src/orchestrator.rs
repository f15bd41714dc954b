//! Run orchestrator
//!
//! The [`Orchestrator`] owns the manifest for the duration of a run:
//!
//! 1. **Load** the manifest (a corrupt manifest aborts the run)
//! 2. **Per folder**: list PDFs newest first, hand each file to the engine
//!    (or the validate-only check), count outcomes, then archive the eligible
//!    subset once the whole listing has been processed
//! 3. **Save** the manifest once, unless validate-only
//!
//! Folders and files are processed strictly one after another. A folder whose
//! listing fails is reported and skipped; per-file failures never stop a run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument, warn};

use pdfsync_core::config::{Config, FolderConfig};
use pdfsync_core::domain::{
    CheckOutcome, FailureKind, Manifest, RemoteFile, RemoteId, SyncOutcome,
};
use pdfsync_core::ports::{
    IManifestStore, IRemoteClient, IRunObserver, NoopObserver, ORDER_BY_MODIFIED_DESC,
    PDF_MIME_TYPE,
};

use crate::archiver::Archiver;
use crate::engine::{SyncEngine, SyncOptions};

// ============================================================================
// Options and report
// ============================================================================

/// Modes for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Re-download files even when the manifest says they are done or failed
    pub force: bool,
    /// Move processed files into the archive folder afterwards
    pub archive: bool,
    /// Only re-validate existing local copies; no transfers, no save
    pub validate_only: bool,
    /// Restrict the run to these folder labels; empty means all
    pub folders: Vec<String>,
}

/// Aggregate counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub success: u32,
    /// Includes files skipped because of a recorded error
    pub skipped: u32,
    pub invalid: u32,
    pub errors: u32,
    pub archived: u32,
    pub archive_failures: u32,
    pub folder_failures: u32,
}

/// One current error entry, flattened for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    pub id: RemoteId,
    pub name: String,
    pub error: String,
    pub kind: Option<FailureKind>,
    pub moved_to: Option<PathBuf>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stats: RunStats,
    /// Every error entry in the manifest after the run, not only new ones
    pub errors: Vec<ReportedError>,
    pub validate_only: bool,
    pub manifest_saved: bool,
    pub duration_ms: u64,
}

fn reported_errors(manifest: &Manifest) -> Vec<ReportedError> {
    manifest
        .errors()
        .iter()
        .map(|(id, entry)| ReportedError {
            id: id.clone(),
            name: entry.name.clone(),
            error: entry.error.clone(),
            kind: entry.kind,
            moved_to: entry.moved_to.clone(),
        })
        .collect()
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Walks every configured source folder and drives the sync engine
pub struct Orchestrator {
    remote: Arc<dyn IRemoteClient>,
    store: Arc<dyn IManifestStore>,
    engine: SyncEngine,
    archiver: Archiver,
    folders: Vec<FolderConfig>,
    observer: Arc<dyn IRunObserver>,
}

impl Orchestrator {
    /// Creates an orchestrator for the folders in `config`
    pub fn new(
        config: &Config,
        remote: Arc<dyn IRemoteClient>,
        store: Arc<dyn IManifestStore>,
    ) -> Self {
        Self {
            engine: SyncEngine::from_config(Arc::clone(&remote), config),
            archiver: Archiver::new(Arc::clone(&remote), config.archive.folder_name.clone()),
            remote,
            store,
            folders: config.folders.clone(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Reports per-file progress to `observer` as it happens
    pub fn with_observer(mut self, observer: Arc<dyn IRunObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn selected_folders(&self, filter: &[String]) -> anyhow::Result<Vec<FolderConfig>> {
        if filter.is_empty() {
            return Ok(self.folders.clone());
        }
        for label in filter {
            if !self.folders.iter().any(|f| &f.label == label) {
                anyhow::bail!("Unknown folder label '{label}'");
            }
        }
        Ok(self
            .folders
            .iter()
            .filter(|f| filter.contains(&f.label))
            .cloned()
            .collect())
    }

    /// Runs one full pass over the selected folders
    ///
    /// # Errors
    /// Returns an error only if the folder filter names an unknown folder, the
    /// manifest cannot be loaded, or the final save fails. Everything else is
    /// counted and reported.
    #[instrument(skip(self))]
    pub async fn run(&mut self, opts: &RunOptions) -> anyhow::Result<RunReport> {
        let start = std::time::Instant::now();
        let folders = self.selected_folders(&opts.folders)?;

        let mut manifest = self.store.load().await.with_context(|| {
            format!(
                "Failed to load manifest from {}",
                self.store.location().display()
            )
        })?;

        info!(
            folders = folders.len(),
            force = opts.force,
            archive = opts.archive,
            validate_only = opts.validate_only,
            "Starting run"
        );

        let mut stats = RunStats::default();
        for folder in &folders {
            self.process_folder(folder, &mut manifest, opts, &mut stats)
                .await;
        }

        let manifest_saved = if opts.validate_only {
            false
        } else {
            self.store
                .save(&mut manifest)
                .await
                .context("Failed to save manifest")?;
            true
        };

        let report = RunReport {
            errors: reported_errors(&manifest),
            stats,
            validate_only: opts.validate_only,
            manifest_saved,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            success = report.stats.success,
            skipped = report.stats.skipped,
            invalid = report.stats.invalid,
            errors = report.stats.errors,
            archived = report.stats.archived,
            duration_ms = report.duration_ms,
            "Run completed"
        );

        Ok(report)
    }

    #[instrument(skip(self, manifest, opts, stats), fields(folder = %folder.label))]
    async fn process_folder(
        &mut self,
        folder: &FolderConfig,
        manifest: &mut Manifest,
        opts: &RunOptions,
        stats: &mut RunStats,
    ) {
        let label = folder.label.as_str();

        let listing = match RemoteId::new(folder.id.clone()) {
            Ok(folder_id) => self
                .remote
                .list_files(&folder_id, PDF_MIME_TYPE, ORDER_BY_MODIFIED_DESC)
                .await
                .map(|files| (folder_id, files)),
            Err(err) => Err(err.into()),
        };
        let (folder_id, files) = match listing {
            Ok(listing) => listing,
            Err(err) => {
                let msg = format!("{err:#}");
                warn!(error = %msg, "Failed to list folder");
                stats.folder_failures += 1;
                self.observer.folder_failed(label, &msg);
                return;
            }
        };

        info!(files = files.len(), "Folder listed");
        self.observer.folder_started(label, files.len());

        let sync_opts = SyncOptions { force: opts.force };
        let mut to_archive: Vec<RemoteFile> = Vec::new();

        for file in &files {
            if opts.validate_only {
                let outcome = self.engine.check_local(file, label).await;
                match outcome {
                    CheckOutcome::Valid { .. } => stats.success += 1,
                    CheckOutcome::Invalid { .. } => stats.invalid += 1,
                    CheckOutcome::Missing { .. } => stats.skipped += 1,
                }
                self.observer.file_checked(label, file, &outcome);
                continue;
            }

            let outcome = self.engine.sync_one(file, label, manifest, sync_opts).await;
            let archivable = match &outcome {
                SyncOutcome::Success { .. } => {
                    stats.success += 1;
                    true
                }
                SyncOutcome::Skipped => {
                    stats.skipped += 1;
                    !manifest.is_archived(&file.id)
                }
                SyncOutcome::SkippedError { .. } => {
                    stats.skipped += 1;
                    false
                }
                SyncOutcome::Invalid { .. } => {
                    stats.invalid += 1;
                    false
                }
                SyncOutcome::TransferError { .. } => {
                    stats.errors += 1;
                    false
                }
            };
            self.observer.file_synced(label, file, &outcome);

            if opts.archive && archivable {
                to_archive.push(file.clone());
            }
        }

        // Archiving starts only after the whole listing has been handled
        for file in &to_archive {
            if self.archiver.archive(file, &folder_id, manifest).await {
                stats.archived += 1;
                let archive_folder = manifest
                    .archived()
                    .get(&file.id)
                    .map(|entry| &entry.archive_folder_id);
                self.observer.file_archived(label, file, archive_folder);
            } else {
                stats.archive_failures += 1;
                self.observer.file_archived(label, file, None);
            }
        }
    }
}
