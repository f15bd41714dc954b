//! Manifest store port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - `load` on a store that has never been saved yields an empty manifest,
//!   not an error. A store that exists but cannot be parsed is an error.
//! - `save` stamps `last_sync` and must replace the previous copy atomically,
//!   so a crash mid-save leaves the old manifest intact.

use std::path::Path;

use crate::domain::manifest::Manifest;

#[async_trait::async_trait]
pub trait IManifestStore: Send + Sync {
    /// Loads the manifest, or an empty one if none was ever saved
    async fn load(&self) -> anyhow::Result<Manifest>;

    /// Stamps `last_sync` with the current time and persists atomically
    async fn save(&self, manifest: &mut Manifest) -> anyhow::Result<()>;

    /// Where the manifest lives, for display
    fn location(&self) -> &Path;
}
