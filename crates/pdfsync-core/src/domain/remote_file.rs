//! Remote file snapshot
//!
//! A [`RemoteFile`] is the immutable view of one remote PDF as returned by a
//! folder listing. It is only valid for the run that listed it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

/// A remote file as seen by a single listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Stable identifier, the key for every manifest map
    pub id: RemoteId,
    /// Display name, also used as the local file name
    pub name: String,
    /// Last modification time reported by the remote
    pub modified_time: Option<DateTime<Utc>>,
    /// Size in bytes, when the remote reports one
    pub size: Option<u64>,
}

impl RemoteFile {
    /// Creates a snapshot with no size or modification time
    pub fn new(id: RemoteId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            modified_time: None,
            size: None,
        }
    }

    /// Sets the reported size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the reported modification time
    pub fn with_modified_time(mut self, modified: DateTime<Utc>) -> Self {
        self.modified_time = Some(modified);
        self
    }
}
