//! Per-file sync engine
//!
//! The [`SyncEngine`] decides what happens to one remote file and records the
//! decision in the in-memory manifest. It never persists the manifest; the
//! orchestrator saves once at the end of a run.
//!
//! ## Decision Order
//!
//! 1. **Fast path**: not forcing, processed as `valid`, and the recorded local
//!    file still exists -> `Skipped` without touching the network
//! 2. **Sticky errors**: not forcing and an error entry exists -> `SkippedError`,
//!    unless the retry policy allows another attempt
//! 3. **Transfer**: download and write atomically; failures become a transfer
//!    error entry -> `TransferError`
//! 4. **Validate**: valid bytes become a processed entry -> `Success`; invalid
//!    bytes are quarantined and recorded as a validation error -> `Invalid`

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use pdfsync_core::config::Config;
use pdfsync_core::domain::{
    CheckOutcome, ErrorEntry, FailureKind, Manifest, ProcessedEntry, RemoteFile, SyncError,
    SyncOutcome,
};
use pdfsync_core::ports::IRemoteClient;

use crate::filesystem::LocalMirror;
use crate::validator::Validator;

/// Per-call options
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Ignore existing processed and error entries
    pub force: bool,
}

/// Drives one remote file through transfer, validation and bookkeeping
pub struct SyncEngine {
    remote: Arc<dyn IRemoteClient>,
    mirror: LocalMirror,
    validator: Validator,
    /// Re-attempt files whose recorded failure was a transfer error
    retry_transfer_errors: bool,
}

impl SyncEngine {
    /// Creates a new `SyncEngine`
    ///
    /// # Arguments
    /// * `remote` - Remote file operations (IRemoteClient)
    /// * `mirror` - Local layout and atomic writes
    /// * `validator` - Checks applied to every download
    /// * `retry_transfer_errors` - Whether transfer failures are retried on later runs
    pub fn new(
        remote: Arc<dyn IRemoteClient>,
        mirror: LocalMirror,
        validator: Validator,
        retry_transfer_errors: bool,
    ) -> Self {
        Self {
            remote,
            mirror,
            validator,
            retry_transfer_errors,
        }
    }

    /// Builds an engine from the application configuration
    pub fn from_config(remote: Arc<dyn IRemoteClient>, config: &Config) -> Self {
        Self::new(
            remote,
            LocalMirror::new(config.output_dir(), config.sync.quarantine_dir.clone()),
            Validator::from_config(&config.validation),
            config.sync.retry_transfer_errors,
        )
    }

    fn is_retryable(&self, entry: &ErrorEntry) -> bool {
        self.retry_transfer_errors && entry.kind == Some(FailureKind::Transfer)
    }

    /// Syncs a single remote file and records the result in `manifest`
    ///
    /// Performs at most one transfer and exactly one manifest mutation per
    /// non-skipped call. Failures never escape as errors; they are returned
    /// as outcomes and recorded as error entries.
    #[instrument(skip(self, file, manifest), fields(file_id = %file.id, name = %file.name))]
    pub async fn sync_one(
        &self,
        file: &RemoteFile,
        label: &str,
        manifest: &mut Manifest,
        opts: SyncOptions,
    ) -> SyncOutcome {
        if !opts.force {
            // Step 1: fast path
            if let Some(entry) = manifest.processed_entry(&file.id) {
                if entry.is_valid() && self.mirror.is_file(&entry.local_path).await {
                    debug!("already processed");
                    return SyncOutcome::Skipped;
                }
            }

            // Step 2: sticky errors
            if let Some(entry) = manifest.error_entry(&file.id) {
                if self.is_retryable(entry) {
                    info!(previous = %entry.error, "retrying previous transfer failure");
                } else {
                    debug!(error = %entry.error, "skipping previously failed file");
                    return SyncOutcome::SkippedError {
                        message: entry.error.clone(),
                    };
                }
            }
        }

        // Step 3: transfer
        let target = self.mirror.target_path(label, file);
        let data = match self.remote.get_content(&file.id).await {
            Ok(data) => data,
            Err(err) => {
                return self.record_transfer_failure(file, manifest, format!("{err:#}"));
            }
        };
        if let Err(err) = self.mirror.write_atomic(&target, &data).await {
            return self.record_transfer_failure(file, manifest, err.to_string());
        }
        debug!(bytes = data.len(), path = %target.display(), "downloaded");

        // Step 4: validate
        let result = self.validator.validate(&target, &file.name).await;
        if result.valid {
            let size = result.size.unwrap_or(data.len() as u64);
            info!(size, path = %target.display(), "file synced");
            manifest.record_success(
                file.id.clone(),
                ProcessedEntry::valid(&file.name, target.clone(), size),
            );
            return SyncOutcome::Success {
                local_path: target,
                size,
            };
        }

        let moved_to = match self.mirror.quarantine(&target).await {
            Ok(dest) => Some(dest),
            Err(err) => {
                warn!(error = %err, "failed to quarantine invalid file, renaming in place");
                match self.mirror.set_aside(&target).await {
                    Ok(dest) => Some(dest),
                    Err(err) => {
                        warn!(
                            error = %err,
                            path = %target.display(),
                            "invalid file left at its output path"
                        );
                        None
                    }
                }
            }
        };
        let error = SyncError::ValidationFailed(result.errors.clone());
        warn!(%error, moved_to = ?moved_to, "file rejected");
        manifest.record_error(
            file.id.clone(),
            ErrorEntry::validation(&file.name, result.joined_errors(), moved_to.clone()),
        );
        SyncOutcome::Invalid {
            errors: result.errors,
            moved_to,
        }
    }

    fn record_transfer_failure(
        &self,
        file: &RemoteFile,
        manifest: &mut Manifest,
        message: String,
    ) -> SyncOutcome {
        let error = SyncError::TransferFailed(message);
        warn!(%error, "transfer failed");
        let message = error.to_string();
        manifest.record_error(file.id.clone(), ErrorEntry::transfer(&file.name, &message));
        SyncOutcome::TransferError { message }
    }

    /// Re-validates the local copy of `file` without any transfer
    ///
    /// Used by validate-only runs. The manifest is neither read nor written.
    #[instrument(skip(self, file), fields(file_id = %file.id, name = %file.name))]
    pub async fn check_local(&self, file: &RemoteFile, label: &str) -> CheckOutcome {
        let local_path = self.mirror.target_path(label, file);
        if !self.mirror.is_file(&local_path).await {
            debug!(path = %local_path.display(), "no local copy");
            return CheckOutcome::Missing { local_path };
        }

        let result = self.validator.validate(&local_path, &file.name).await;
        if result.valid {
            CheckOutcome::Valid { local_path }
        } else {
            CheckOutcome::Invalid {
                local_path,
                errors: result.errors,
            }
        }
    }
}
