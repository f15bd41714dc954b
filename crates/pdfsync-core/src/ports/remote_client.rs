//! Remote client port (driven/secondary port)
//!
//! This module defines the interface for the cloud drive holding the source
//! folders. The primary implementation targets the Google Drive v3 API, but
//! nothing here is specific to it.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific;
//!   the sync engine turns them into manifest entries as plain messages.
//! - Uses `#[async_trait]` for async trait methods.
//! - "Folders" are whatever container the remote uses to group files.

use crate::domain::newtypes::RemoteId;
use crate::domain::remote_file::RemoteFile;

/// MIME type of the files mirrored by PDFSync
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Ordering requested for folder listings: most recently modified first
pub const ORDER_BY_MODIFIED_DESC: &str = "modifiedTime desc";

/// Port trait for the remote file store
///
/// ## Implementation Notes
///
/// - `list_files` must return every matching, non-trashed file, following
///   pagination internally.
/// - `find_folder` returns `Ok(None)` when nothing matches; only transport or
///   API failures are errors.
/// - All methods assume valid credentials; token refresh is handled by the
///   implementation.
#[async_trait::async_trait]
pub trait IRemoteClient: Send + Sync {
    /// Lists the files of `folder_id` whose MIME type is `mime_type`
    ///
    /// # Arguments
    /// * `folder_id` - The folder to list
    /// * `mime_type` - Only files of this type are returned
    /// * `order_by` - Provider ordering expression, e.g. [`ORDER_BY_MODIFIED_DESC`]
    async fn list_files(
        &self,
        folder_id: &RemoteId,
        mime_type: &str,
        order_by: &str,
    ) -> anyhow::Result<Vec<RemoteFile>>;

    /// Downloads a file's content by its remote ID
    async fn get_content(&self, file_id: &RemoteId) -> anyhow::Result<Vec<u8>>;

    /// Looks up a child folder of `parent_id` by exact name
    async fn find_folder(&self, parent_id: &RemoteId, name: &str)
        -> anyhow::Result<Option<RemoteId>>;

    /// Creates a child folder of `parent_id` and returns its id
    async fn create_folder(&self, parent_id: &RemoteId, name: &str) -> anyhow::Result<RemoteId>;

    /// Moves a file from one parent folder to another
    async fn move_file(
        &self,
        file_id: &RemoteId,
        from_parent: &RemoteId,
        to_parent: &RemoteId,
    ) -> anyhow::Result<()>;
}
