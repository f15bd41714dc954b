//! Config command - View and check PDFSync configuration
//!
//! Provides the `pdfsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports every problem
//! 3. Prints the path of the configuration file in use

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use pdfsync_core::config::Config;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => self.execute_path(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();
        let config = ctx.load_config()?;

        info!(config_path = %config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");
            for line in config.to_yaml()?.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Exits non-zero when the file is missing, unparseable or invalid
    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();

        // Load explicitly: a missing file is a validation failure here
        let config = Config::load(&config_path)?;

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            let json = serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            });
            formatter.print_json(&json);
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info(&format!("Folders: {}", config.folders.len()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration is invalid");
        }
        Ok(())
    }

    fn execute_path(&self, ctx: &CommandContext) -> Result<()> {
        let config_path = ctx.config_path();
        if ctx.is_json() {
            ctx.formatter().print_json(&serde_json::json!({
                "config_path": config_path.display().to_string(),
                "exists": config_path.exists(),
            }));
        } else {
            println!("{}", config_path.display());
        }
        Ok(())
    }
}
