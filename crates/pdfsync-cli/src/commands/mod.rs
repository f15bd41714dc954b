//! CLI subcommands
//!
//! Each subcommand is a clap type with an async `execute` taking the shared
//! [`CommandContext`].

pub mod auth;
pub mod completions;
pub mod config;
pub mod reset;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pdfsync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options every subcommand sees
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub quiet: bool,
    /// `--config`, if given
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format == OutputFormat::Json)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// The configuration file in effect
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(Config::default_path)
    }

    /// Loads the configuration
    ///
    /// An explicit `--config` file must exist. The default location may be
    /// absent, in which case built-in defaults apply.
    pub fn load_config(&self) -> Result<Config> {
        load_config_from(self.config_path.as_deref())
    }

    /// Loads the configuration and rejects it if validation fails
    pub fn load_valid_config(&self) -> Result<Config> {
        let config = self.load_config()?;
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!(
                "Invalid configuration ({}): {}",
                self.config_path().display(),
                messages.join("; ")
            );
        }
        Ok(config)
    }
}

fn load_config_from(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => {
            let path = Config::default_path();
            if path.exists() {
                Config::load(&path)
            } else {
                Ok(Config::default())
            }
        }
    }
    .context("Failed to load configuration")
}
