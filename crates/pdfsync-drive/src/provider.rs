//! DriveRemoteClient - IRemoteClient implementation for Google Drive
//!
//! Wraps the [`DriveClient`] together with the run's [`CredentialSession`].
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::Mutex` because `IRemoteClient` methods take `&self`
//!   while `DriveClient::set_access_token` requires `&mut self`.
//! - Before each call the session is asked for a valid access token; after
//!   each call, successful or not, refreshed tokens are written back.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use pdfsync_core::domain::{RemoteFile, RemoteId};
use pdfsync_core::ports::IRemoteClient;

use crate::auth::CredentialSession;
use crate::client::DriveClient;

/// Remote client backed by the Google Drive v3 API
pub struct DriveRemoteClient {
    client: Mutex<DriveClient>,
    session: Arc<CredentialSession>,
}

impl DriveRemoteClient {
    pub fn new(client: DriveClient, session: Arc<CredentialSession>) -> Self {
        Self {
            client: Mutex::new(client),
            session,
        }
    }

    /// Locks the client with a current access token installed
    async fn authorized(&self) -> Result<MutexGuard<'_, DriveClient>> {
        let token = self.session.access_token().await?;
        let mut client = self.client.lock().await;
        if client.access_token() != token {
            client.set_access_token(token);
        }
        Ok(client)
    }

    async fn after_call(&self) {
        if let Err(e) = self.session.persist_if_changed().await {
            warn!(error = %format!("{e:#}"), "Could not persist refreshed tokens");
        }
    }
}

#[async_trait::async_trait]
impl IRemoteClient for DriveRemoteClient {
    async fn list_files(
        &self,
        folder_id: &RemoteId,
        mime_type: &str,
        order_by: &str,
    ) -> Result<Vec<RemoteFile>> {
        let result = {
            let client = self.authorized().await?;
            client.list_files(folder_id, mime_type, order_by).await
        };
        self.after_call().await;
        result.with_context(|| format!("Failed to list folder {folder_id}"))
    }

    async fn get_content(&self, file_id: &RemoteId) -> Result<Vec<u8>> {
        let result = {
            let client = self.authorized().await?;
            client.download(file_id).await
        };
        self.after_call().await;
        result.with_context(|| format!("Failed to download {file_id}"))
    }

    async fn find_folder(&self, parent_id: &RemoteId, name: &str) -> Result<Option<RemoteId>> {
        let result = {
            let client = self.authorized().await?;
            client.find_folder(parent_id, name).await
        };
        self.after_call().await;
        result.with_context(|| format!("Failed to look up folder '{name}' in {parent_id}"))
    }

    async fn create_folder(&self, parent_id: &RemoteId, name: &str) -> Result<RemoteId> {
        let result = {
            let client = self.authorized().await?;
            client.create_folder(parent_id, name).await
        };
        self.after_call().await;
        result.with_context(|| format!("Failed to create folder '{name}' in {parent_id}"))
    }

    async fn move_file(
        &self,
        file_id: &RemoteId,
        from_parent: &RemoteId,
        to_parent: &RemoteId,
    ) -> Result<()> {
        let result = {
            let client = self.authorized().await?;
            client.move_file(file_id, from_parent, to_parent).await
        };
        self.after_call().await;
        result.with_context(|| format!("Failed to move {file_id} to {to_parent}"))
    }
}
