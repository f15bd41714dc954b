//! Per-file outcomes
//!
//! [`SyncOutcome`] is what the sync engine returns for one remote file;
//! [`CheckOutcome`] is what validate-only mode reports for one local file.
//! The orchestrator only ever sees these values, never the underlying errors.

use std::path::PathBuf;

use serde::Serialize;

/// Result of syncing one remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Already processed and the local copy is still present
    Skipped,
    /// A previous attempt failed and the failure is sticky
    SkippedError { message: String },
    /// Downloaded, validated and recorded
    Success { local_path: PathBuf, size: u64 },
    /// Downloaded but rejected; the bytes were quarantined
    Invalid {
        errors: Vec<String>,
        moved_to: Option<PathBuf>,
    },
    /// The content could not be fetched or written
    TransferError { message: String },
}

impl SyncOutcome {
    /// Short lowercase label used in logs and console output
    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::SkippedError { .. } => "skipped_error",
            SyncOutcome::Success { .. } => "success",
            SyncOutcome::Invalid { .. } => "invalid",
            SyncOutcome::TransferError { .. } => "transfer_error",
        }
    }
}

/// Result of re-validating a local copy without transferring anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Valid { local_path: PathBuf },
    Invalid { local_path: PathBuf, errors: Vec<String> },
    Missing { local_path: PathBuf },
}

impl CheckOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Valid { .. } => "valid",
            CheckOutcome::Invalid { .. } => "invalid",
            CheckOutcome::Missing { .. } => "missing",
        }
    }
}
