//! PDFSync CLI - Mirror Google Drive PDF folders to local disk
//!
//! Provides commands for:
//! - Running a sync pass (with force, archive and validate-only modes)
//! - Inspecting and resetting the manifest
//! - Managing stored credentials
//! - Viewing and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    auth::AuthCommand, completions::CompletionsCommand, config::ConfigCommand,
    reset::ResetCommand, status::StatusCommand, sync::SyncCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "pdfsync",
    version,
    about = "Mirror Google Drive PDF folders to a local directory"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download new PDFs from every configured folder
    Sync(SyncCommand),
    /// Show manifest summary and recorded errors
    Status(StatusCommand),
    /// Forget manifest entries so the next sync retries them
    Reset(ResetCommand),
    /// Credential commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Log filter when `RUST_LOG` is unset
fn default_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    match (quiet, verbose) {
        (true, _) => "warn".to_string(),
        (false, 0) => configured.to_string(),
        (false, 1) => "debug".to_string(),
        (false, _) => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = CommandContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
        config_path: cli.config.clone(),
    };

    // Setup tracing; a broken config file is reported by the command itself
    let configured_level = ctx
        .load_config()
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let filter = default_filter(cli.verbose, cli.quiet, &configured_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Reset(cmd) => cmd.execute(&ctx).await,
        Commands::Auth(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}
