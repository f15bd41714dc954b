//! Domain error types
//!
//! This module defines the error taxonomy shared by every crate:
//! identifier validation failures, per-file sync failures, and the
//! authentication failures that abort a run before it starts.

use thiserror::Error;

/// Errors that can occur when constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),
}

/// Per-file failures produced while syncing a single remote file
///
/// None of these abort a run. The sync engine turns `TransferFailed` and
/// `ValidationFailed` into manifest error entries; the archiver only logs
/// `ArchiveFailed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The remote content could not be fetched or written locally
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// The downloaded bytes are not an acceptable PDF
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// The remote file could not be moved into the archive folder
    #[error("Archive failed: {0}")]
    ArchiveFailed(String),
}

/// Failures while obtaining an authenticated remote client
///
/// These are fatal: a run stops before any folder is processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Stored credentials exist but can no longer be refreshed
    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    /// No credentials have been stored for the configured account
    #[error("No stored credentials: {0}")]
    MissingCredentials(String),

    /// The credential store itself failed
    #[error("Credential storage error: {0}")]
    Storage(String),
}
