//! The `list` subcommand: show configured sources.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::load_manifest;
use crate::manifest::ListingSpec;

/// Print each configured source with its descriptor directory and listing.
#[derive(Args)]
pub struct ListCommand {}

impl ListCommand {
    /// Execute the listing.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let manifest = load_manifest(manifest_path)?;

        if manifest.sources.is_empty() {
            println!("no sources configured");
            return Ok(());
        }

        for (name, spec) in &manifest.sources {
            let listing = match &spec.listing {
                ListingSpec::Page { url, .. } => format!("page {url}"),
                ListingSpec::GithubReleases { owner, repo } => {
                    format!("github releases {owner}/{repo}")
                }
            };
            println!(
                "{} ({}/*.{}) <- {}",
                name.bold(),
                spec.directory.display(),
                spec.extension,
                listing
            );
        }

        Ok(())
    }
}
