//! Status command - Display manifest state
//!
//! Provides the `pdfsync status` CLI command which:
//! 1. Shows the last sync time and processed / error / archived counts
//! 2. Lists every recorded error with its quarantine location
//!
//! The manifest is only read, never written.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pdfsync_core::domain::Manifest;
use pdfsync_core::ports::IManifestStore;
use pdfsync_state::JsonManifestStore;

use super::CommandContext;
use crate::output::OutputFormatter;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config()?;

        let manifest_path = config.manifest_path();
        let store = JsonManifestStore::new(manifest_path.clone());
        let manifest = store.load().await.with_context(|| {
            format!("Failed to load manifest from {}", manifest_path.display())
        })?;

        info!(manifest = %manifest_path.display(), "Showing status");

        if ctx.is_json() {
            formatter.print_json(&status_json(&manifest, &manifest_path));
        } else {
            print_status(&manifest, &manifest_path, &*formatter);
        }
        Ok(())
    }
}

fn status_json(manifest: &Manifest, manifest_path: &std::path::Path) -> serde_json::Value {
    let summary = manifest.summary();
    let errors: Vec<serde_json::Value> = manifest
        .errors()
        .iter()
        .map(|(id, entry)| {
            serde_json::json!({
                "id": id,
                "name": entry.name,
                "error": entry.error,
                "kind": entry.kind,
                "last_attempt": entry.last_attempt,
                "moved_to": entry.moved_to,
            })
        })
        .collect();

    serde_json::json!({
        "manifest_path": manifest_path.display().to_string(),
        "summary": summary,
        "errors": errors,
    })
}

fn print_status(manifest: &Manifest, manifest_path: &std::path::Path, fmt: &dyn OutputFormatter) {
    let summary = manifest.summary();

    fmt.success(&format!("Manifest: {}", manifest_path.display()));
    let last_sync = summary
        .last_sync
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    fmt.field("Last sync", &last_sync);
    fmt.field("Processed", &summary.processed.to_string());
    fmt.field("Errors", &summary.errors.to_string());
    fmt.field("Archived", &summary.archived.to_string());

    if manifest.errors().is_empty() {
        return;
    }

    fmt.info("");
    fmt.warn(&format!("Files with errors ({}):", summary.errors));
    for (id, entry) in manifest.errors() {
        let kind = entry
            .kind
            .map(|k| format!(" ({k})"))
            .unwrap_or_default();
        fmt.info(&format!("{} [{}]{}: {}", entry.name, id, kind, entry.error));
        fmt.info(&format!(
            "    last attempt {}",
            entry.last_attempt.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(moved_to) = &entry.moved_to {
            fmt.info(&format!("    quarantined at {}", moved_to.display()));
        }
    }
}
