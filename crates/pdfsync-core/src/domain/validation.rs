//! Validation result value
//!
//! Produced fresh by every validator call and never persisted directly;
//! the sync engine copies the messages into an error entry when needed.

use serde::{Deserialize, Serialize};

/// Outcome of checking one local file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty
    pub valid: bool,
    /// Reasons for rejection, in check order
    pub errors: Vec<String>,
    /// Size on disk, absent when the file does not exist
    pub size: Option<u64>,
    pub size_formatted: Option<String>,
}

impl ValidationResult {
    /// Result for a path that does not exist
    pub fn missing() -> Self {
        Self {
            valid: false,
            errors: vec!["File does not exist".to_string()],
            size: None,
            size_formatted: None,
        }
    }

    /// Result for an existing file of `size` bytes with the collected `errors`
    pub fn from_checks(size: u64, errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            size: Some(size),
            size_formatted: Some(format_size(size)),
        }
    }

    /// All messages joined into the single string stored in the manifest
    pub fn joined_errors(&self) -> String {
        self.errors.join("; ")
    }
}

/// Formats a byte count using binary units with two decimals
///
/// `512` becomes `"512 B"`, `1536` becomes `"1.50 KB"`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.2} KB", b / KB)
    } else if b < GB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
