//! JSON implementation of IManifestStore
//!
//! The manifest is kept as one pretty-printed JSON document. Saves go through
//! a sibling temporary file that is flushed to disk and then renamed over the
//! target, so readers only ever observe the old or the new manifest.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use pdfsync_core::domain::Manifest;
use pdfsync_core::ports::IManifestStore;

use crate::StoreError;

/// File-backed manifest store
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    /// Creates a store for the manifest at `path`. Nothing is read yet.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read(&self) -> Result<Manifest, StoreError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no manifest yet, starting empty");
                return Ok(Manifest::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes `manifest` as-is, leaving `last_sync` untouched
    ///
    /// Used for edits outside a run, such as resetting entries.
    pub async fn write(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.tmp_path();
        debug!(?tmp_path, bytes = json.len(), "writing manifest to temporary file");

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&json).await.map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IManifestStore for JsonManifestStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> anyhow::Result<Manifest> {
        let manifest = self.read().await?;
        let summary = manifest.summary();
        debug!(
            processed = summary.processed,
            errors = summary.errors,
            archived = summary.archived,
            "manifest loaded"
        );
        Ok(manifest)
    }

    #[instrument(skip(self, manifest), fields(path = %self.path.display()))]
    async fn save(&self, manifest: &mut Manifest) -> anyhow::Result<()> {
        manifest.mark_synced(Utc::now());
        self.write(manifest).await?;
        info!("manifest saved");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
