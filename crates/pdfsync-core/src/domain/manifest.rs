//! Persisted sync manifest
//!
//! The [`Manifest`] is the single source of truth for "already handled"
//! state. It maps remote file ids to one of three records:
//!
//! - [`ProcessedEntry`] - terminal success, the file is mirrored locally
//! - [`ErrorEntry`] - terminal failure (transfer or validation)
//! - [`ArchivedEntry`] - the remote file was moved to an archive folder
//!
//! An id is never present in both `processed` and `errors`; the `record_*`
//! methods maintain that. `archived` is independent and usually follows a
//! processed entry.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

// ============================================================================
// Entries
// ============================================================================

/// Status recorded for a processed file
///
/// Only `valid` is ever written. Anything else found in a hand-edited
/// manifest is read back as `Unknown` and treated as not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessedStatus {
    Valid,
    #[serde(other)]
    Unknown,
}

/// A file that was downloaded and passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub name: String,
    pub processed_at: DateTime<Utc>,
    pub status: ProcessedStatus,
    /// Where the validated bytes were written
    pub local_path: PathBuf,
    pub size: u64,
}

impl ProcessedEntry {
    /// Creates a `valid` entry stamped with the current time
    pub fn valid(name: impl Into<String>, local_path: PathBuf, size: u64) -> Self {
        Self {
            name: name.into(),
            processed_at: Utc::now(),
            status: ProcessedStatus::Valid,
            local_path,
            size,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ProcessedStatus::Valid
    }
}

/// Which stage produced an [`ErrorEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The content could not be fetched or written
    Transfer,
    /// The content was fetched but rejected by the validator
    Validation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Transfer => "transfer",
            FailureKind::Validation => "validation",
        };
        write!(f, "{}", s)
    }
}

/// A file whose last attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub name: String,
    pub error: String,
    pub last_attempt: DateTime<Utc>,
    /// Quarantine location of the rejected bytes, if they were kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_to: Option<PathBuf>,
    /// Absent in manifests written before failures were classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ErrorEntry {
    /// A transfer failure stamped with the current time
    pub fn transfer(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
            last_attempt: Utc::now(),
            moved_to: None,
            kind: Some(FailureKind::Transfer),
        }
    }

    /// A validation failure stamped with the current time
    pub fn validation(
        name: impl Into<String>,
        error: impl Into<String>,
        moved_to: Option<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
            last_attempt: Utc::now(),
            moved_to,
            kind: Some(FailureKind::Validation),
        }
    }
}

/// A remote file that was moved into an archive folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedEntry {
    pub name: String,
    pub archived_at: DateTime<Utc>,
    pub archive_folder_id: RemoteId,
}

impl ArchivedEntry {
    pub fn new(name: impl Into<String>, archive_folder_id: RemoteId) -> Self {
        Self {
            name: name.into(),
            archived_at: Utc::now(),
            archive_folder_id,
        }
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Counts shown by `pdfsync status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    pub last_sync: Option<DateTime<Utc>>,
    pub processed: usize,
    pub errors: usize,
    pub archived: usize,
}

/// Durable map of remote file id to processing outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    processed: BTreeMap<RemoteId, ProcessedEntry>,
    #[serde(default)]
    errors: BTreeMap<RemoteId, ErrorEntry>,
    #[serde(default)]
    archived: BTreeMap<RemoteId, ArchivedEntry>,
}

impl Manifest {
    /// An empty manifest that has never been saved
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Stamps the time of the save that is about to happen
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_sync = Some(at);
    }

    pub fn processed(&self) -> &BTreeMap<RemoteId, ProcessedEntry> {
        &self.processed
    }

    pub fn errors(&self) -> &BTreeMap<RemoteId, ErrorEntry> {
        &self.errors
    }

    pub fn archived(&self) -> &BTreeMap<RemoteId, ArchivedEntry> {
        &self.archived
    }

    pub fn processed_entry(&self, id: &RemoteId) -> Option<&ProcessedEntry> {
        self.processed.get(id)
    }

    pub fn error_entry(&self, id: &RemoteId) -> Option<&ErrorEntry> {
        self.errors.get(id)
    }

    pub fn is_archived(&self, id: &RemoteId) -> bool {
        self.archived.contains_key(id)
    }

    /// True when `id` has a processed entry with status `valid`
    pub fn is_processed_valid(&self, id: &RemoteId) -> bool {
        self.processed.get(id).is_some_and(ProcessedEntry::is_valid)
    }

    /// Records a success, discarding any earlier error for the same id
    pub fn record_success(&mut self, id: RemoteId, entry: ProcessedEntry) {
        self.errors.remove(&id);
        self.processed.insert(id, entry);
    }

    /// Records a failure, discarding any earlier success for the same id
    pub fn record_error(&mut self, id: RemoteId, entry: ErrorEntry) {
        self.processed.remove(&id);
        self.errors.insert(id, entry);
    }

    pub fn record_archived(&mut self, id: RemoteId, entry: ArchivedEntry) {
        self.archived.insert(id, entry);
    }

    /// Drops every record for `id` so the next run treats it as new.
    ///
    /// Returns `true` if anything was removed.
    pub fn forget(&mut self, id: &RemoteId) -> bool {
        let processed = self.processed.remove(id).is_some();
        let errored = self.errors.remove(id).is_some();
        let archived = self.archived.remove(id).is_some();
        processed || errored || archived
    }

    /// Drops all error entries, returning how many were removed
    pub fn clear_errors(&mut self) -> usize {
        let count = self.errors.len();
        self.errors.clear();
        count
    }

    /// Drops every entry but keeps `last_sync`
    pub fn clear(&mut self) {
        self.processed.clear();
        self.errors.clear();
        self.archived.clear();
    }

    /// True when no id appears in both `processed` and `errors`
    pub fn is_consistent(&self) -> bool {
        self.processed.keys().all(|id| !self.errors.contains_key(id))
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            last_sync: self.last_sync,
            processed: self.processed.len(),
            errors: self.errors.len(),
            archived: self.archived.len(),
        }
    }
}
