//! Command-line interface for upsync.
//!
//! Each subcommand is a separate module with its own argument struct and
//! execution logic:
//!
//! - `check` - discover the latest upstream version for one or all sources
//!   without touching the repository
//! - `sync` - discover and re-point descriptor files at the latest version
//! - `list` - show the sources configured in the manifest
//!
//! Global flags control verbosity (`--verbose` / `--quiet`) and manifest
//! location (`--manifest-path`). By default the manifest is found by walking
//! up from the current directory, so any directory inside the descriptor
//! repository works.

mod check;
mod list;
mod sync;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::manifest::{self, Manifest};

/// Top-level CLI for upsync.
#[derive(Parser)]
#[command(
    name = "upsync",
    about = "Keeps a package-descriptor repository pointed at the latest upstream releases",
    version,
    long_about = "upsync checks each configured upstream listing for the latest released \
                  version and renames/rewrites the matching descriptor file to track it. \
                  One invocation performs one synchronization pass; scheduling is external."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress everything except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the manifest file (upsync.toml).
    ///
    /// By default upsync searches the current directory and its parents.
    #[arg(long, global = true)]
    manifest_path: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Discover the latest upstream version without modifying anything.
    Check(check::CheckCommand),

    /// Point descriptor files at the latest upstream versions.
    Sync(sync::SyncCommand),

    /// List the sources configured in the manifest.
    List(list::ListCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// Initializes logging from the verbosity flags, then dispatches to the
    /// subcommand. Errors propagate to `main` for user-friendly display and
    /// exit-code selection.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);

        match self.command {
            Commands::Check(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Sync(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::List(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the CLI flags.
/// Logs go to stderr so stdout stays a clean one-line-per-source summary.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the manifest, either from an explicit path or by walking up from the
/// current directory.
pub(crate) fn load_manifest(manifest_path: Option<PathBuf>) -> Result<Manifest> {
    let path = match manifest_path {
        Some(path) => path,
        None => manifest::find_manifest()?,
    };
    Manifest::load(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_and_quiet_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["upsync", "-v", "-q", "list"]).is_err());
    }

    #[test]
    fn sync_accepts_an_optional_source_name() {
        assert!(Cli::try_parse_from(["upsync", "sync"]).is_ok());
        assert!(Cli::try_parse_from(["upsync", "sync", "linux-vanilla"]).is_ok());
    }
}
