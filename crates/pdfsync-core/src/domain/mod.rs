//! Domain entities and business logic
//!
//! This module contains the core domain types for PDFSync:
//! - Newtypes for type-safe identifiers
//! - The remote file snapshot handed out by the remote client
//! - The persisted manifest and its three entry kinds
//! - Validation results and per-file outcomes
//! - Domain-specific error types

pub mod errors;
pub mod manifest;
pub mod newtypes;
pub mod outcome;
pub mod remote_file;
pub mod validation;

// Re-export commonly used types
pub use errors::{AuthError, DomainError, SyncError};
pub use manifest::{
    ArchivedEntry, ErrorEntry, FailureKind, Manifest, ManifestSummary, ProcessedEntry,
    ProcessedStatus,
};
pub use newtypes::RemoteId;
pub use outcome::{CheckOutcome, SyncOutcome};
pub use remote_file::RemoteFile;
pub use validation::{format_size, ValidationResult};
