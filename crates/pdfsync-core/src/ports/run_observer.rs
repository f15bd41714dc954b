//! Run observer port
//!
//! Lets the caller echo every per-file outcome the moment it happens instead
//! of waiting for the final report. All methods have empty defaults, so an
//! implementation only overrides what it displays.

use crate::domain::newtypes::RemoteId;
use crate::domain::outcome::{CheckOutcome, SyncOutcome};
use crate::domain::remote_file::RemoteFile;

pub trait IRunObserver: Send + Sync {
    /// A folder listing succeeded with `file_count` files
    fn folder_started(&self, _label: &str, _file_count: usize) {}

    /// A folder listing failed; the run moves on to the next folder
    fn folder_failed(&self, _label: &str, _error: &str) {}

    /// The sync engine finished one file
    fn file_synced(&self, _label: &str, _file: &RemoteFile, _outcome: &SyncOutcome) {}

    /// Validate-only mode checked one file
    fn file_checked(&self, _label: &str, _file: &RemoteFile, _outcome: &CheckOutcome) {}

    /// The archiver finished one file
    fn file_archived(&self, _label: &str, _file: &RemoteFile, _archive_folder: Option<&RemoteId>) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl IRunObserver for NoopObserver {}
