//! Sync command - Mirror the configured folders
//!
//! Provides the `pdfsync sync` CLI command which:
//! 1. Loads and validates the configuration
//! 2. Obtains an authenticated Drive client (refreshing the token if needed)
//! 3. Runs the Orchestrator over every selected folder, echoing each outcome
//! 4. Prints the run summary and every recorded error
//!
//! Per-file failures never make the command fail; only configuration,
//! authentication and manifest problems do.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pdfsync_core::domain::{format_size, CheckOutcome, RemoteFile, RemoteId, SyncOutcome};
use pdfsync_core::ports::{IAuthProvider, IRunObserver, NoopObserver};
use pdfsync_drive::DriveAuthProvider;
use pdfsync_state::JsonManifestStore;
use pdfsync_sync::{Orchestrator, RunOptions};

use super::CommandContext;
use crate::output::{HumanFormatter, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Re-download files even if already processed or previously failed
    #[arg(long)]
    pub force: bool,

    /// Move successfully synced files into the archive folder on Drive
    #[arg(long)]
    pub archive: bool,

    /// Re-validate existing local copies only; no downloads, manifest untouched
    #[arg(long, conflicts_with_all = ["force", "archive"])]
    pub validate_only: bool,

    /// Only process the folder with this label (repeatable)
    #[arg(long = "folder", value_name = "LABEL")]
    pub folders: Vec<String>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();

        // Step 1: Configuration
        let config = ctx.load_valid_config()?;
        info!(
            config_path = %ctx.config_path().display(),
            folders = config.folders.len(),
            "Loaded configuration"
        );

        // Step 2: Credentials
        let auth = DriveAuthProvider::from_config(&config)?;
        let remote = auth
            .get_client()
            .await
            .context("Authentication failed")?;

        // Step 3: Run
        let store = Arc::new(JsonManifestStore::new(config.manifest_path()));
        let observer: Arc<dyn IRunObserver> = if ctx.is_json() {
            Arc::new(NoopObserver)
        } else {
            Arc::new(ConsoleObserver { quiet: ctx.quiet })
        };

        if self.validate_only {
            formatter.info("Validating local copies (no downloads)...");
        } else {
            formatter.info(&format!(
                "Syncing into {}",
                config.output_dir().display()
            ));
        }

        let options = RunOptions {
            force: self.force,
            archive: self.archive,
            validate_only: self.validate_only,
            folders: self.folders.clone(),
        };
        let report = Orchestrator::new(&config, remote, store)
            .with_observer(observer)
            .run(&options)
            .await?;

        // Step 4: Summary
        formatter.run_report(&report);

        Ok(())
    }
}

// ============================================================================
// ConsoleObserver
// ============================================================================

/// Echoes each outcome as soon as the orchestrator reports it
struct ConsoleObserver {
    quiet: bool,
}

impl IRunObserver for ConsoleObserver {
    fn folder_started(&self, label: &str, file_count: usize) {
        if !self.quiet {
            HumanFormatter.info(&format!("{}: {} PDF file(s)", label, file_count));
        }
    }

    fn folder_failed(&self, label: &str, error: &str) {
        HumanFormatter.error(&format!("{}: cannot list folder: {}", label, error));
    }

    fn file_synced(&self, label: &str, file: &RemoteFile, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Success { size, .. } if !self.quiet => {
                HumanFormatter.success(&format!(
                    "{}/{} ({})",
                    label,
                    file.name,
                    format_size(*size)
                ));
            }
            SyncOutcome::Invalid { errors, moved_to } => {
                let mut message = format!("{}/{}: {}", label, file.name, errors.join("; "));
                if let Some(path) = moved_to {
                    message.push_str(&format!(" (moved to {})", path.display()));
                }
                HumanFormatter.error(&message);
            }
            SyncOutcome::TransferError { message } => {
                HumanFormatter.error(&format!("{}/{}: {}", label, file.name, message));
            }
            _ => {}
        }
    }

    fn file_checked(&self, label: &str, file: &RemoteFile, outcome: &CheckOutcome) {
        match outcome {
            CheckOutcome::Valid { .. } if !self.quiet => {
                HumanFormatter.success(&format!("{}/{}", label, file.name));
            }
            CheckOutcome::Invalid { errors, .. } => {
                HumanFormatter.error(&format!("{}/{}: {}", label, file.name, errors.join("; ")));
            }
            CheckOutcome::Missing { local_path } if !self.quiet => {
                HumanFormatter.warn(&format!(
                    "{}/{}: no local copy at {}",
                    label,
                    file.name,
                    local_path.display()
                ));
            }
            _ => {}
        }
    }

    fn file_archived(&self, label: &str, file: &RemoteFile, archive_folder: Option<&RemoteId>) {
        match archive_folder {
            Some(_) if !self.quiet => {
                HumanFormatter.info(&format!("archived {}/{}", label, file.name));
            }
            Some(_) => {}
            None => HumanFormatter.warn(&format!("{}/{}: archiving failed", label, file.name)),
        }
    }
}
