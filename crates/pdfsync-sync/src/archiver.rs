//! Remote archiving
//!
//! After a folder has been processed, successfully mirrored files can be moved
//! out of the source folder into an archive folder living inside it. The
//! archive folder is looked up by name first and only created when absent, so
//! repeated runs reuse the same folder.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use pdfsync_core::domain::{ArchivedEntry, Manifest, RemoteFile, RemoteId, SyncError};
use pdfsync_core::ports::IRemoteClient;

/// Moves processed remote files into a per-source archive folder
pub struct Archiver {
    remote: Arc<dyn IRemoteClient>,
    folder_name: String,
    /// Archive folder id per source folder, resolved at most once per run
    resolved: HashMap<RemoteId, RemoteId>,
}

impl Archiver {
    pub fn new(remote: Arc<dyn IRemoteClient>, folder_name: impl Into<String>) -> Self {
        Self {
            remote,
            folder_name: folder_name.into(),
            resolved: HashMap::new(),
        }
    }

    /// Finds the archive folder under `source_folder`, creating it if needed
    async fn resolve_archive_folder(&mut self, source_folder: &RemoteId) -> anyhow::Result<RemoteId> {
        if let Some(id) = self.resolved.get(source_folder) {
            return Ok(id.clone());
        }

        let existing = self
            .remote
            .find_folder(source_folder, &self.folder_name)
            .await
            .context("Failed to look up archive folder")?;

        let id = match existing {
            Some(id) => {
                debug!(archive_folder = %id, "reusing archive folder");
                id
            }
            None => {
                let id = self
                    .remote
                    .create_folder(source_folder, &self.folder_name)
                    .await
                    .context("Failed to create archive folder")?;
                info!(archive_folder = %id, name = %self.folder_name, "created archive folder");
                id
            }
        };

        self.resolved.insert(source_folder.clone(), id.clone());
        Ok(id)
    }

    /// Moves `file` from `source_folder` into the archive folder
    ///
    /// On success an [`ArchivedEntry`] is recorded and `true` is returned.
    /// Any failure is logged and reported as `false`; the manifest is left
    /// untouched in that case.
    #[instrument(skip(self, file, manifest), fields(file_id = %file.id, name = %file.name))]
    pub async fn archive(
        &mut self,
        file: &RemoteFile,
        source_folder: &RemoteId,
        manifest: &mut Manifest,
    ) -> bool {
        let result = async {
            let archive_folder = self.resolve_archive_folder(source_folder).await?;
            self.remote
                .move_file(&file.id, source_folder, &archive_folder)
                .await
                .context("Failed to move file")?;
            anyhow::Ok(archive_folder)
        }
        .await;

        match result {
            Ok(archive_folder) => {
                info!(archive_folder = %archive_folder, "file archived");
                manifest.record_archived(
                    file.id.clone(),
                    ArchivedEntry::new(&file.name, archive_folder),
                );
                true
            }
            Err(err) => {
                let error = SyncError::ArchiveFailed(format!("{err:#}"));
                warn!(%error, "archiving failed");
                false
            }
        }
    }
}
