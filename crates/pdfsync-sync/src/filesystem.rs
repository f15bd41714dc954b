//! Local mirror layout and file operations
//!
//! Every remote file has one deterministic local path:
//! `<output_root>/<folder label>/<sanitized name>`. Rejected downloads are
//! moved into a sibling quarantine directory, `<output_root>/<label>/_invalid/`.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: content goes to a `.part` file in the same directory
//!   and is renamed into place, so an interrupted transfer never leaves a
//!   truncated file at the deterministic path.
//! - **Quarantine is a move**: rejected bytes are kept for inspection and
//!   never deleted. A name already taken in `_invalid/` gets a ` (n)` suffix
//!   instead of being overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use pdfsync_core::domain::RemoteFile;

use crate::LocalFsError;

/// Replaces characters that cannot appear in a single path component.
///
/// Names that would resolve to the folder itself or its parent, and names
/// that are empty after trimming, fall back to `<fallback_id>.pdf`.
pub fn sanitize_file_name(name: &str, fallback_id: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        format!("{fallback_id}.pdf")
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut p = path.as_os_str().to_owned();
    p.push(suffix);
    PathBuf::from(p)
}

/// `dir/stem (n).ext`, or `dir/name (n)` when there is no extension
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    };
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> LocalFsError {
    LocalFsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The on-disk layout of the mirror
#[derive(Debug, Clone)]
pub struct LocalMirror {
    output_root: PathBuf,
    quarantine_dir: String,
}

impl LocalMirror {
    /// Create a mirror rooted at `output_root`.
    #[must_use]
    pub fn new(output_root: PathBuf, quarantine_dir: impl Into<String>) -> Self {
        Self {
            output_root,
            quarantine_dir: quarantine_dir.into(),
        }
    }

    /// Deterministic local path for `file` in the folder labelled `label`
    pub fn target_path(&self, label: &str, file: &RemoteFile) -> PathBuf {
        self.output_root
            .join(label)
            .join(sanitize_file_name(&file.name, file.id.as_str()))
    }

    /// Where [`LocalMirror::quarantine`] moves `path` when the name is free
    pub fn quarantine_path(&self, path: &Path) -> Option<PathBuf> {
        let parent = path.parent()?;
        let name = path.file_name()?;
        Some(parent.join(&self.quarantine_dir).join(name))
    }

    /// Writes `data` to `path` via a temporary sibling and a rename.
    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    pub async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), LocalFsError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let tmp_path = with_suffix(path, ".part");
        debug!(?tmp_path, "writing to temporary file");

        let result: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, path).await
        }
        .await;

        if let Err(e) = result {
            // best effort
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(path, e));
        }

        debug!("write complete");
        Ok(())
    }

    /// First of `candidate`, `stem (1).ext`, `stem (2).ext`, ... not yet taken
    async fn unused_path(&self, candidate: PathBuf) -> Result<PathBuf, LocalFsError> {
        let mut path = candidate.clone();
        let mut n = 0;
        while tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))?
        {
            n += 1;
            path = numbered(&candidate, n);
        }
        Ok(path)
    }

    /// Moves a rejected file into the quarantine directory beside it.
    ///
    /// Returns the new location. Earlier quarantined files are never
    /// replaced; a taken name is numbered instead.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn quarantine(&self, path: &Path) -> Result<PathBuf, LocalFsError> {
        let dest = self.quarantine_path(path).ok_or_else(|| LocalFsError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "path has no parent or file name"),
        })?;

        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error(dir, e))?;
        }
        let dest = self.unused_path(dest).await?;
        tokio::fs::rename(path, &dest)
            .await
            .map_err(|e| io_error(path, e))?;

        debug!(dest = %dest.display(), "file quarantined");
        Ok(dest)
    }

    /// Renames a rejected file to `<name>.invalid` in its own directory.
    ///
    /// Used when the quarantine directory cannot be used, so the rejected
    /// bytes still leave the deterministic path.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn set_aside(&self, path: &Path) -> Result<PathBuf, LocalFsError> {
        let dest = self.unused_path(with_suffix(path, ".invalid")).await?;
        tokio::fs::rename(path, &dest)
            .await
            .map_err(|e| io_error(path, e))?;

        debug!(dest = %dest.display(), "file set aside");
        Ok(dest)
    }

    /// True if `path` exists as a regular file
    pub async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
