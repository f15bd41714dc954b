//! PDFSync Drive - Google Drive v3 adapter
//!
//! Provides:
//! - A typed HTTP client for the handful of Drive endpoints the sync needs
//! - OAuth2 refresh-token handling with tokens kept in the system keyring
//! - [`IRemoteClient`](pdfsync_core::ports::IRemoteClient) and
//!   [`IAuthProvider`](pdfsync_core::ports::IAuthProvider) implementations
//!
//! ## Modules
//!
//! - [`auth`] - Token storage, refresh and the auth provider
//! - [`client`] - Google Drive v3 HTTP client
//! - [`provider`] - Port adapter wiring the client to a credential session

pub mod auth;
pub mod client;
pub mod provider;

pub use auth::{
    CredentialSession, DriveAuthProvider, KeyringTokenStorage, OAuthRefresher, TokenRefresher,
    TokenStore, KEYRING_SERVICE,
};
pub use client::DriveClient;
pub use provider::DriveRemoteClient;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Google Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// The access token was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested file or folder does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or had an unexpected status
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Longest response body echoed into an error message
const MAX_ERROR_BODY: usize = 300;

impl DriveError {
    /// Maps a non-success status and its body to a typed error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = truncate_body(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests(message),
            s if s.is_server_error() => Self::ServerError {
                status: s.as_u16(),
                message,
            },
            s => Self::InvalidResponse(format!("HTTP {}: {message}", s.as_u16())),
        }
    }

    /// True for errors that indicate the credentials are no longer accepted
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
