//! PDFSync Sync - Download, validation and archiving pipeline
//!
//! Provides:
//! - Per-file sync decisions (skip, download, validate, quarantine, record)
//! - PDF validation of downloaded bytes
//! - Optional archiving of processed remote files
//! - A run orchestrator that walks every configured source folder
//!
//! ## Modules
//!
//! - [`validator`] - Size and `%PDF-` header checks
//! - [`filesystem`] - Deterministic local layout, atomic writes, quarantine
//! - [`engine`] - The per-file state machine driving the manifest
//! - [`archiver`] - Find-or-create archive folders and move remote files
//! - [`orchestrator`] - Folder loop, counters, deferred archiving, final save

pub mod archiver;
pub mod engine;
pub mod filesystem;
pub mod orchestrator;
pub mod validator;

use std::path::PathBuf;

use thiserror::Error;

pub use archiver::Archiver;
pub use engine::{SyncEngine, SyncOptions};
pub use filesystem::LocalMirror;
pub use orchestrator::{Orchestrator, ReportedError, RunOptions, RunReport, RunStats};
pub use validator::Validator;

/// Errors raised by local filesystem operations
#[derive(Debug, Error)]
pub enum LocalFsError {
    /// An I/O error occurred on the given path
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
