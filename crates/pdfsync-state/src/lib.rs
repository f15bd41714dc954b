//! PDFSync State - Manifest persistence
//!
//! JSON-file storage for the sync manifest: which remote files were
//! processed, which failed, and which were archived.
//!
//! ## Architecture
//!
//! This crate implements the `IManifestStore` port from `pdfsync-core`
//! using a single pretty-printed JSON document. It is a driven (secondary)
//! adapter in the hexagonal architecture and the only code that touches the
//! manifest file.
//!
//! ## Key Components
//!
//! - [`JsonManifestStore`] - Full `IManifestStore` implementation
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//! use pdfsync_core::ports::IManifestStore;
//! use pdfsync_state::JsonManifestStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = JsonManifestStore::new(PathBuf::from("/home/user/.local/share/pdfsync/manifest.json"));
//! let mut manifest = store.load().await?;
//! // mutate manifest...
//! store.save(&mut manifest).await?;
//! # Ok(())
//! # }
//! ```

pub mod store;

pub use store::JsonManifestStore;

/// Errors that can occur during manifest store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the manifest file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file exists but is not a valid manifest document
    #[error("Corrupt manifest {path}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory manifest could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
