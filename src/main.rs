//! upsync CLI entry point.
//!
//! Parses command-line arguments, runs the selected subcommand, and turns
//! failures into user-friendly messages with distinct exit codes: structural
//! invariant violations exit with status 2, other failures with status 1.

use anyhow::Result;
use clap::Parser;
use upsync::cli;
use upsync::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(&e);
            error_ctx.display();
            std::process::exit(error_ctx.exit_code);
        }
    }
}
