//! The `check` subcommand: discover latest versions, touch nothing.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::load_manifest;
use crate::descriptor;
use crate::discover;
use crate::net::{Fetcher, RetryPolicy};

/// Report the latest upstream version for each selected source alongside the
/// version the descriptor currently records. Read-only: no rename, no
/// rewrite.
#[derive(Args)]
pub struct CheckCommand {
    /// Source to check; all configured sources when omitted.
    source: Option<String>,
}

impl CheckCommand {
    /// Execute the check pass.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let manifest = load_manifest(manifest_path)?;
        let fetcher = Fetcher::new(RetryPolicy::default())?;

        for (name, spec) in manifest.select(self.source.as_deref())? {
            let candidates = discover::fetch_candidates(&fetcher, spec).await?;
            let resolved = discover::discover_latest(name, candidates)?;

            let directory = manifest.source_dir(spec);
            let current = descriptor::current_version(&directory, &spec.extension)?;

            match resolved.version.compare(&current)? {
                Ordering::Greater => println!(
                    "{}: {} -> {} available",
                    name.bold(),
                    current,
                    resolved.version.to_string().green().bold()
                ),
                // The descriptor may record a tagged version that outranks
                // the bare upstream release; that still counts as current.
                Ordering::Less | Ordering::Equal => {
                    println!("{}: up to date ({current})", name.bold());
                }
            }
        }

        Ok(())
    }
}
