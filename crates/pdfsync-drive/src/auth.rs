//! OAuth2 credentials for the Google Drive API
//!
//! PDFSync never runs an interactive login itself. Tokens obtained elsewhere
//! are imported once into the system keyring; from then on the refresh token
//! keeps the access token alive.
//!
//! ## Components
//!
//! - [`TokenStore`] / [`KeyringTokenStorage`] - Where tokens live between runs
//! - [`TokenRefresher`] / [`OAuthRefresher`] - The refresh-token grant
//! - [`CredentialSession`] - Current tokens for one run, refreshed on demand
//!   and written back after each remote call
//! - [`DriveAuthProvider`] - The [`IAuthProvider`] used at startup

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use oauth2::{
    basic::BasicClient, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    TokenResponse, TokenUrl,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use pdfsync_core::config::Config;
use pdfsync_core::domain::AuthError;
use pdfsync_core::ports::{IAuthProvider, IRemoteClient, Tokens};

use crate::client::DriveClient;
use crate::provider::DriveRemoteClient;

/// Keyring service name for storing tokens
pub const KEYRING_SERVICE: &str = "pdfsync";

/// Access tokens expiring sooner than this are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

// ============================================================================
// TokenStore
// ============================================================================

/// Persistent storage for one account's tokens
pub trait TokenStore: Send + Sync {
    /// Returns the stored tokens, or `None` when nothing is stored
    fn load(&self) -> Result<Option<Tokens>>;

    fn store(&self, tokens: &Tokens) -> Result<()>;

    /// Removes the stored tokens; succeeds when nothing was stored
    fn clear(&self) -> Result<()>;
}

/// Stores and retrieves OAuth tokens from the system keyring
///
/// Uses the `keyring` crate to store tokens securely in the OS credential
/// store (e.g., GNOME Keyring, KDE Wallet, macOS Keychain).
/// Tokens are serialized as JSON with the service name "pdfsync" and the
/// configured account name as the username.
pub struct KeyringTokenStorage {
    account: String,
}

impl KeyringTokenStorage {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.account)
            .context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStorage {
    fn load(&self) -> Result<Option<Tokens>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let tokens: Tokens = serde_json::from_str(&json)
                    .context("Failed to deserialize tokens from keyring")?;
                debug!("Loaded tokens from keyring for account: {}", self.account);
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No tokens found in keyring for account: {}", self.account);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn store(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store tokens in keyring")?;

        debug!("Stored tokens in keyring for account: {}", self.account);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!("Cleared tokens from keyring for account: {}", self.account);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No tokens to clear for account: {}", self.account);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

/// Exchanges a refresh token for a new access token
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<Tokens>;
}

type RefreshClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Refresh-token grant using the `oauth2` crate
pub struct OAuthRefresher {
    /// `None` when no client id is configured; every refresh then fails
    client: Option<RefreshClient>,
    http: reqwest::Client,
}

impl OAuthRefresher {
    /// Creates a refresher for the given OAuth client
    ///
    /// # Arguments
    /// * `client_id` - OAuth client id; without one, refreshing is impossible
    /// * `client_secret` - Secret for installed-app clients, if any
    /// * `token_url` - Token endpoint for the refresh grant
    pub fn new(
        client_id: Option<&str>,
        client_secret: Option<&str>,
        token_url: &str,
    ) -> Result<Self> {
        let client = match client_id {
            Some(id) => {
                let mut client = BasicClient::new(ClientId::new(id.to_string())).set_token_uri(
                    TokenUrl::new(token_url.to_string()).context("Invalid token URL")?,
                );
                if let Some(secret) = client_secret {
                    client = client.set_client_secret(ClientSecret::new(secret.to_string()));
                }
                Some(client)
            }
            None => None,
        };

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self { client, http })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.auth.client_id.as_deref(),
            config.auth.client_secret.as_deref(),
            &config.auth.token_url,
        )
    }
}

#[async_trait::async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let Some(client) = &self.client else {
            anyhow::bail!("No OAuth client_id configured; cannot refresh the access token");
        };

        info!("Refreshing access token");
        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .context("Failed to refresh token")?;

        let expires_at = token_result
            .expires_in()
            .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));

        let tokens = Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| Some(refresh_token.to_string())),
            expires_at,
        };

        info!("Successfully refreshed access token");
        Ok(tokens)
    }
}

// ============================================================================
// CredentialSession
// ============================================================================

struct SessionState {
    current: Tokens,
    persisted: Tokens,
}

/// Tokens in use for one run
///
/// [`CredentialSession::access_token`] refreshes when the token is about to
/// expire. The refreshed tokens are only written to the store by
/// [`CredentialSession::persist_if_changed`], which the provider calls after
/// every remote call.
pub struct CredentialSession {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    state: Mutex<SessionState>,
}

impl CredentialSession {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        tokens: Tokens,
    ) -> Self {
        Self {
            store,
            refresher,
            state: Mutex::new(SessionState {
                current: tokens.clone(),
                persisted: tokens,
            }),
        }
    }

    /// Returns an access token valid for at least the refresh margin
    ///
    /// # Errors
    /// [`AuthError::AuthExpired`] when a refresh is needed but there is no
    /// refresh token or the grant is rejected.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        if !state
            .current
            .expires_within(Duration::seconds(REFRESH_MARGIN_SECS))
        {
            return Ok(state.current.access_token.clone());
        }

        let Some(refresh_token) = state.current.refresh_token.clone() else {
            return Err(AuthError::AuthExpired(
                "access token expired and no refresh token is stored".to_string(),
            ));
        };

        let tokens = self
            .refresher
            .refresh(&refresh_token)
            .await
            .map_err(|e| AuthError::AuthExpired(format!("{e:#}")))?;
        state.current = tokens;
        Ok(state.current.access_token.clone())
    }

    /// Writes the current tokens to the store if they changed since the last
    /// write. Returns whether anything was written.
    pub async fn persist_if_changed(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.current == state.persisted {
            return Ok(false);
        }
        self.store
            .store(&state.current)
            .context("Failed to persist refreshed tokens")?;
        state.persisted = state.current.clone();
        debug!("Persisted refreshed tokens");
        Ok(true)
    }

    /// Snapshot of the tokens currently in use
    pub async fn current(&self) -> Tokens {
        self.state.lock().await.current.clone()
    }
}

// ============================================================================
// DriveAuthProvider
// ============================================================================

/// Builds an authenticated [`DriveRemoteClient`] from stored credentials
pub struct DriveAuthProvider {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    base_url: String,
    page_size: u32,
}

impl DriveAuthProvider {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        base_url: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            refresher,
            base_url: base_url.into(),
            page_size,
        }
    }

    /// Keyring storage and OAuth refresh as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(KeyringTokenStorage::new(config.auth.account.clone())),
            Arc::new(OAuthRefresher::from_config(config)?),
            config.drive.base_url.clone(),
            config.drive.page_size,
        ))
    }
}

#[async_trait::async_trait]
impl IAuthProvider for DriveAuthProvider {
    async fn get_client(&self) -> Result<Arc<dyn IRemoteClient>, AuthError> {
        let tokens = self
            .store
            .load()
            .map_err(|e| AuthError::Storage(format!("{e:#}")))?
            .ok_or_else(|| {
                AuthError::MissingCredentials(
                    "run `pdfsync auth import <token-file>` first".to_string(),
                )
            })?;

        let session = Arc::new(CredentialSession::new(
            Arc::clone(&self.store),
            Arc::clone(&self.refresher),
            tokens,
        ));

        // Fail before any folder is touched if the credentials are dead
        let access_token = session.access_token().await?;
        if let Err(e) = session.persist_if_changed().await {
            warn!(error = %format!("{e:#}"), "Could not persist refreshed tokens");
        }

        let client = DriveClient::with_base_url(access_token, self.base_url.clone())
            .with_page_size(self.page_size);
        Ok(Arc::new(DriveRemoteClient::new(client, session)))
    }
}
