//! Authentication port (driven/secondary port)
//!
//! The sync core never sees credentials. It asks an [`IAuthProvider`] for a
//! ready-to-use [`IRemoteClient`] once at startup; if that fails the run is
//! aborted before any folder is processed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::remote_client::IRemoteClient;
use crate::domain::errors::AuthError;

// ============================================================================
// Tokens struct
// ============================================================================

/// OAuth tokens for the remote API
///
/// Contains the access token for API requests, an optional refresh token
/// for obtaining new access tokens, and the expiration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for refreshing the access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: chrono::Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }
}

// ============================================================================
// IAuthProvider trait
// ============================================================================

/// Port trait yielding an authenticated remote client
#[async_trait::async_trait]
pub trait IAuthProvider: Send + Sync {
    /// Returns a client backed by valid credentials
    ///
    /// # Errors
    /// - [`AuthError::MissingCredentials`] if nothing is stored
    /// - [`AuthError::AuthExpired`] if stored credentials cannot be refreshed
    async fn get_client(&self) -> Result<Arc<dyn IRemoteClient>, AuthError>;
}
