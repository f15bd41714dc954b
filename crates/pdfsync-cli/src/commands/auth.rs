//! Auth commands - Import, Logout, and Status for Drive credentials
//!
//! Provides the `pdfsync auth` CLI subcommands which:
//! 1. `import` - Reads an OAuth token JSON obtained elsewhere and stores it in
//!    the system keyring under the configured account.
//! 2. `logout` - Removes the stored tokens.
//! 3. `status` - Shows whether tokens are stored and when they expire.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use serde::Deserialize;
use tracing::info;

use pdfsync_core::ports::Tokens;
use pdfsync_drive::{KeyringTokenStorage, TokenStore};

use super::CommandContext;
use crate::output::OutputFormatter;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store tokens from a JSON file in the system keyring
    Import {
        /// File holding `access_token`, `refresh_token` and `expires_at` or `expires_in`
        file: PathBuf,
    },
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let config = ctx.load_config()?;
        let storage = KeyringTokenStorage::new(config.auth.account.clone());

        match self {
            AuthCommand::Import { file } => execute_import(&storage, file, &*fmt),
            AuthCommand::Logout => execute_logout(&storage, &*fmt),
            AuthCommand::Status => execute_status(&storage, ctx, &*fmt),
        }
    }
}

/// Token file as written by common OAuth tools
///
/// Either an absolute `expires_at` or a relative `expires_in` (seconds) is
/// accepted. Without either, the access token is treated as already expired
/// and the first sync refreshes it.
#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    expires_in: Option<i64>,
}

fn parse_token_file(json: &str, now: DateTime<Utc>) -> Result<Tokens> {
    let file: TokenFile = serde_json::from_str(json).context("Invalid token file")?;
    if file.access_token.trim().is_empty() && file.refresh_token.is_none() {
        anyhow::bail!("Token file holds neither an access token nor a refresh token");
    }

    let expires_at = file
        .expires_at
        .or_else(|| file.expires_in.map(|secs| now + Duration::seconds(secs)))
        .unwrap_or(now);

    Ok(Tokens {
        access_token: file.access_token,
        refresh_token: file.refresh_token.filter(|t| !t.is_empty()),
        expires_at,
    })
}

fn execute_import(
    storage: &KeyringTokenStorage,
    file: &Path,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read token file {}", file.display()))?;
    let tokens = parse_token_file(&json, Utc::now())?;

    storage
        .store(&tokens)
        .context("Failed to store tokens in keyring")?;
    info!(account = %storage.account(), "Imported tokens");

    fmt.success(&format!("Stored credentials for account '{}'", storage.account()));
    if tokens.refresh_token.is_none() {
        fmt.warn("No refresh token; syncing stops working once the access token expires");
    }
    fmt.print_json(&serde_json::json!({
        "success": true,
        "account": storage.account(),
        "expires_at": tokens.expires_at,
        "has_refresh_token": tokens.refresh_token.is_some(),
    }));
    Ok(())
}

fn execute_logout(storage: &KeyringTokenStorage, fmt: &dyn OutputFormatter) -> Result<()> {
    storage.clear().context("Failed to clear tokens from keyring")?;
    fmt.success(&format!("Logged out account '{}'", storage.account()));
    fmt.print_json(&serde_json::json!({
        "success": true,
        "account": storage.account(),
    }));
    Ok(())
}

fn execute_status(
    storage: &KeyringTokenStorage,
    ctx: &CommandContext,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    let tokens = storage.load().context("Failed to read tokens from keyring")?;

    if ctx.is_json() {
        let json = match &tokens {
            Some(t) => serde_json::json!({
                "authenticated": true,
                "account": storage.account(),
                "expires_at": t.expires_at,
                "expired": t.is_expired(),
                "has_refresh_token": t.refresh_token.is_some(),
            }),
            None => serde_json::json!({
                "authenticated": false,
                "account": storage.account(),
            }),
        };
        fmt.print_json(&json);
        return Ok(());
    }

    match tokens {
        Some(t) => {
            fmt.success(&format!("Credentials stored for account '{}'", storage.account()));
            let state = if t.is_expired() { "expired" } else { "valid" };
            fmt.info(&format!(
                "Access token: {} (expires {})",
                state,
                t.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            if t.refresh_token.is_some() {
                fmt.info("Refresh token: present");
            } else {
                fmt.warn("No refresh token stored");
            }
        }
        None => {
            fmt.error(&format!(
                "No credentials for account '{}'. Run 'pdfsync auth import <file>' first.",
                storage.account()
            ));
        }
    }
    Ok(())
}
