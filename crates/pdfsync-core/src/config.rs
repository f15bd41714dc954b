//! Configuration module for PDFSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! The configuration is built once at startup and passed by reference to every
//! component; nothing reads it from global state.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for PDFSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    /// Source folders to mirror, processed in order.
    pub folders: Vec<FolderConfig>,
    pub validation: ValidationConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub drive: DriveConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory of the local mirror. Each folder gets a subdirectory.
    pub output_dir: PathBuf,
    /// Location of the JSON manifest.
    pub manifest_path: PathBuf,
    /// Name of the per-folder quarantine directory for rejected downloads.
    pub quarantine_dir: String,
    /// Re-attempt files whose last failure was a transfer error.
    /// Validation failures always stay sticky until reset or `--force`.
    pub retry_transfer_errors: bool,
}

/// A remote source folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Local name of the folder; becomes the subdirectory under `output_dir`.
    pub label: String,
    /// Remote folder id.
    pub id: String,
}

/// Download validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Smallest accepted file, inclusive.
    pub min_size_bytes: u64,
    /// Largest accepted file, inclusive.
    pub max_size_bytes: u64,
}

/// Remote archiving settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Name of the archive folder created inside each source folder.
    pub folder_name: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Keyring account name the tokens are stored under.
    pub account: String,
    /// OAuth client id. `None` until the user configures one.
    pub client_id: Option<String>,
    /// OAuth client secret, required by installed-app clients.
    pub client_secret: Option<String>,
    /// Token endpoint used for refresh-token grants.
    pub token_url: String,
}

/// Google Drive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// API base URL; overridden in tests.
    pub base_url: String,
    /// Files requested per listing page (1..=1000).
    pub page_size: u32,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/pdfsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pdfsync")
            .join("config.yaml")
    }

    /// Output root with a leading `~` expanded.
    pub fn output_dir(&self) -> PathBuf {
        expand_home(&self.sync.output_dir)
    }

    /// Manifest location with a leading `~` expanded.
    pub fn manifest_path(&self) -> PathBuf {
        expand_home(&self.sync.manifest_path)
    }

    /// Render the configuration back to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

/// Expands a leading `~` or `~/` against the user's home directory.
///
/// Paths that do not start with `~` are returned unchanged, as is everything
/// when no home directory can be determined.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.
// (clippy::derivable_impls)

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pdfsync");
        Self {
            output_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("PDFSync"),
            manifest_path: data_dir.join("manifest.json"),
            quarantine_dir: "_invalid".to_string(),
            retry_transfer_errors: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_size_bytes: 1024,
            max_size_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            folder_name: "Archived".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            account: "default".to_string(),
            client_id: None,
            client_secret: None,
            token_url: "https://oauth2.googleapis.com/token".to_string(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com".to_string(),
            page_size: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"validation.min_size_bytes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page size the Drive API honours.
const MAX_PAGE_SIZE: u32 = 1000;

fn is_single_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if !is_single_component(&self.sync.quarantine_dir) {
            errors.push(ValidationError {
                field: "sync.quarantine_dir".into(),
                message: "must be a single, non-empty directory name".into(),
            });
        }
        if self.sync.manifest_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.manifest_path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- folders ---
        if self.folders.is_empty() {
            errors.push(ValidationError {
                field: "folders".into(),
                message: "at least one folder must be configured".into(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for (i, folder) in self.folders.iter().enumerate() {
            if !is_single_component(&folder.label) {
                errors.push(ValidationError {
                    field: format!("folders[{i}].label"),
                    message: format!("invalid label '{}'; must be a single directory name", folder.label),
                });
            } else if folder.label == self.sync.quarantine_dir {
                errors.push(ValidationError {
                    field: format!("folders[{i}].label"),
                    message: "must differ from sync.quarantine_dir".into(),
                });
            }
            if !seen.insert(folder.label.as_str()) {
                errors.push(ValidationError {
                    field: format!("folders[{i}].label"),
                    message: format!("duplicate label '{}'", folder.label),
                });
            }
            if folder.id.trim().is_empty() {
                errors.push(ValidationError {
                    field: format!("folders[{i}].id"),
                    message: "must not be empty".into(),
                });
            }
        }

        // --- validation ---
        if self.validation.max_size_bytes == 0 {
            errors.push(ValidationError {
                field: "validation.max_size_bytes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.validation.min_size_bytes > self.validation.max_size_bytes {
            errors.push(ValidationError {
                field: "validation.min_size_bytes".into(),
                message: format!(
                    "min_size_bytes ({}) must not exceed max_size_bytes ({})",
                    self.validation.min_size_bytes, self.validation.max_size_bytes
                ),
            });
        }

        // --- archive ---
        if !is_single_component(&self.archive.folder_name) {
            errors.push(ValidationError {
                field: "archive.folder_name".into(),
                message: "must be a single, non-empty folder name".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- auth ---
        if self.auth.account.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.account".into(),
                message: "must not be empty".into(),
            });
        }
        if !is_http_url(&self.auth.token_url) {
            errors.push(ValidationError {
                field: "auth.token_url".into(),
                message: format!("not an http(s) URL: {}", self.auth.token_url),
            });
        }

        // --- drive ---
        if !is_http_url(&self.drive.base_url) {
            errors.push(ValidationError {
                field: "drive.base_url".into(),
                message: format!("not an http(s) URL: {}", self.drive.base_url),
            });
        }
        if self.drive.page_size == 0 || self.drive.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "drive.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use pdfsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .output_dir(PathBuf::from("/home/user/PDFSync"))
///     .folder("invoices", "1AbCdEfGh")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.config.sync.output_dir = dir;
        self
    }

    pub fn manifest_path(mut self, path: PathBuf) -> Self {
        self.config.sync.manifest_path = path;
        self
    }

    pub fn quarantine_dir(mut self, name: impl Into<String>) -> Self {
        self.config.sync.quarantine_dir = name.into();
        self
    }

    pub fn retry_transfer_errors(mut self, retry: bool) -> Self {
        self.config.sync.retry_transfer_errors = retry;
        self
    }

    // --- folders ---

    /// Append a source folder.
    pub fn folder(mut self, label: impl Into<String>, id: impl Into<String>) -> Self {
        self.config.folders.push(FolderConfig {
            label: label.into(),
            id: id.into(),
        });
        self
    }

    // --- validation ---

    pub fn min_size_bytes(mut self, bytes: u64) -> Self {
        self.config.validation.min_size_bytes = bytes;
        self
    }

    pub fn max_size_bytes(mut self, bytes: u64) -> Self {
        self.config.validation.max_size_bytes = bytes;
        self
    }

    // --- archive ---

    pub fn archive_folder_name(mut self, name: impl Into<String>) -> Self {
        self.config.archive.folder_name = name.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- auth ---

    pub fn auth_account(mut self, account: impl Into<String>) -> Self {
        self.config.auth.account = account.into();
        self
    }

    pub fn auth_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: Option<String>,
    ) -> Self {
        self.config.auth.client_id = Some(client_id.into());
        self.config.auth.client_secret = client_secret;
        self
    }

    pub fn auth_token_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth.token_url = url.into();
        self
    }

    // --- drive ---

    pub fn drive_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.base_url = url.into();
        self
    }

    pub fn drive_page_size(mut self, size: u32) -> Self {
        self.config.drive.page_size = size;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
