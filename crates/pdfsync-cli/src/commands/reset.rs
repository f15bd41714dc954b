//! Reset command - Forget manifest entries
//!
//! Provides the `pdfsync reset` CLI command. Forgotten files are treated as
//! new by the next sync, which is how a single failed file is retried without
//! forcing the whole run.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use tracing::info;

use pdfsync_core::domain::{Manifest, RemoteId};
use pdfsync_core::ports::IManifestStore;
use pdfsync_state::JsonManifestStore;

use super::CommandContext;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["ids", "errors", "all"])))]
pub struct ResetCommand {
    /// Remote file ids to forget
    pub ids: Vec<String>,

    /// Forget every recorded error
    #[arg(long)]
    pub errors: bool,

    /// Forget everything (processed, errors and archived)
    #[arg(long)]
    pub all: bool,
}

/// What a reset removed
#[derive(Debug, Default, PartialEq, Eq)]
struct ResetOutcome {
    removed: usize,
    unknown: Vec<String>,
}

impl ResetCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config()?;

        let store = JsonManifestStore::new(config.manifest_path());
        let mut manifest = store.load().await.with_context(|| {
            format!(
                "Failed to load manifest from {}",
                store.location().display()
            )
        })?;

        let outcome = self.apply(&mut manifest)?;
        if outcome.removed > 0 {
            store
                .write(&manifest)
                .await
                .context("Failed to save manifest")?;
        }
        info!(removed = outcome.removed, "Manifest entries reset");

        for id in &outcome.unknown {
            formatter.warn(&format!("{} is not in the manifest", id));
        }

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "removed": outcome.removed,
                "unknown": outcome.unknown,
            }));
        } else {
            let noun = if outcome.removed == 1 { "entry" } else { "entries" };
            formatter.success(&format!("Reset {} {}", outcome.removed, noun));
        }
        Ok(())
    }

    fn apply(&self, manifest: &mut Manifest) -> Result<ResetOutcome> {
        if self.all {
            let removed = manifest.processed().len()
                + manifest.errors().len()
                + manifest.archived().len();
            manifest.clear();
            return Ok(ResetOutcome {
                removed,
                unknown: Vec::new(),
            });
        }

        if self.errors {
            return Ok(ResetOutcome {
                removed: manifest.clear_errors(),
                unknown: Vec::new(),
            });
        }

        let mut outcome = ResetOutcome::default();
        for raw in &self.ids {
            let id: RemoteId = raw
                .parse()
                .with_context(|| format!("Invalid file id '{}'", raw))?;
            if manifest.forget(&id) {
                outcome.removed += 1;
            } else {
                outcome.unknown.push(raw.clone());
            }
        }
        Ok(outcome)
    }
}
