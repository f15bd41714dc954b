//! PDF download validator
//!
//! Classifies a local file as an acceptable PDF or not. The checks are
//! deliberately cheap: presence, size bounds, and the `%PDF-` magic prefix.
//! They exist to catch the common ways a "successful" download is garbage,
//! such as an HTML login page served with a 200 status or a truncated body.
//!
//! The validator is read-only. It never moves, truncates or deletes the file
//! it inspects.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use pdfsync_core::config::ValidationConfig;
use pdfsync_core::domain::{format_size, ValidationResult};

/// Magic prefix every PDF starts with
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Bytes sampled from the start of the file
const HEADER_SAMPLE_LEN: u64 = 512;

/// How many leading bytes are echoed back in a header mismatch message
const PREFIX_ECHO_LEN: usize = 8;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Message added when the sampled header looks like markup
pub const HTML_REDIRECT_MESSAGE: &str =
    "Received HTML document instead of PDF (likely an authentication redirect page)";

/// Size and header checks for downloaded files
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    min_size: u64,
    max_size: u64,
}

impl Validator {
    /// Create a validator accepting sizes in `min_size..=max_size`.
    pub fn new(min_size: u64, max_size: u64) -> Self {
        Self { min_size, max_size }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.min_size_bytes, config.max_size_bytes)
    }

    /// Validates the file at `path`.
    ///
    /// A missing file short-circuits with a single error. Otherwise every
    /// check runs and every failure is reported, in order: size floor, size
    /// ceiling, magic prefix, markup detection.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn validate(&self, path: &Path, declared_name: &str) -> ValidationResult {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("file missing");
                return ValidationResult::missing();
            }
            Err(e) => {
                return ValidationResult {
                    valid: false,
                    errors: vec![format!("Cannot read file metadata: {e}")],
                    size: None,
                    size_formatted: None,
                };
            }
        };

        if !metadata.is_file() {
            return ValidationResult::from_checks(
                metadata.len(),
                vec!["Not a regular file".to_string()],
            );
        }

        let size = metadata.len();
        let mut errors = Vec::new();

        if size < self.min_size {
            errors.push(format!(
                "File too small: {} (minimum {})",
                format_size(size),
                format_size(self.min_size)
            ));
        }
        if size > self.max_size {
            errors.push(format!(
                "File too large: {} (maximum {})",
                format_size(size),
                format_size(self.max_size)
            ));
        }

        match read_header(path).await {
            Ok(header) => errors.extend(check_header(&header)),
            Err(e) => errors.push(format!("Cannot read file header: {e}")),
        }

        let result = ValidationResult::from_checks(size, errors);
        debug!(
            valid = result.valid,
            size,
            errors = result.errors.len(),
            "validated"
        );
        result
    }
}

async fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(HEADER_SAMPLE_LEN as usize);
    file.take(HEADER_SAMPLE_LEN).read_to_end(&mut header).await?;
    Ok(header)
}

/// Header checks on the sampled bytes; empty when the prefix is `%PDF-`.
fn check_header(header: &[u8]) -> Vec<String> {
    if header.starts_with(PDF_MAGIC) {
        return Vec::new();
    }

    let echoed = &header[..header.len().min(PREFIX_ECHO_LEN)];
    let mut errors = vec![format!(
        "Invalid PDF header: expected \"%PDF-\", found \"{}\"",
        echoed.escape_ascii()
    )];
    if looks_like_markup(header) {
        errors.push(HTML_REDIRECT_MESSAGE.to_string());
    }
    errors
}

/// True when the first meaningful byte is `<`, ignoring a BOM and whitespace.
fn looks_like_markup(header: &[u8]) -> bool {
    let body = header.strip_prefix(UTF8_BOM).unwrap_or(header);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}
