//! The `sync` subcommand: point descriptors at the latest upstream versions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::cli::load_manifest;
use crate::descriptor;
use crate::discover;
use crate::net::{Fetcher, RetryPolicy};

/// Discover the latest version for each selected source and update its
/// descriptor file.
///
/// For every source this runs the full pipeline: fetch the listing (with
/// unbounded retry on transient network failures), fold the candidates to
/// the newest version, rename the descriptor and rewrite its `SRC_URI`
/// line. Sources are processed sequentially; the first structural error
/// aborts the run.
#[derive(Args)]
pub struct SyncCommand {
    /// Source to sync; all configured sources when omitted.
    source: Option<String>,
}

impl SyncCommand {
    /// Execute the sync pass.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let manifest = load_manifest(manifest_path)?;
        let fetcher = Fetcher::new(RetryPolicy::default())?;

        for (name, spec) in manifest.select(self.source.as_deref())? {
            let candidates = discover::fetch_candidates(&fetcher, spec).await?;
            let resolved = discover::discover_latest(name, candidates)?;
            info!("{name}: latest upstream version is {}", resolved.version);

            let directory = manifest.source_dir(spec);
            let update = descriptor::update_descriptor(
                &directory,
                &spec.extension,
                &resolved.version,
                &resolved.url,
            )
            .with_context(|| format!("failed to update descriptor for source '{name}'"))?;

            let file = update
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| update.path.display().to_string());
            if update.changed() {
                println!("{}: {} updated.", name.bold(), file.green());
            } else {
                println!("{}: {} already up to date.", name.bold(), file);
            }
        }

        Ok(())
    }
}
