//! revwatch CLI
//!
//! Usage: revwatch [OPTIONS] <ROOT>

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    commands::watch::cmd_watch(
        &cli.root,
        cli.config.as_deref(),
        cli.json,
        cli.verbose,
        cli.quiet,
    )
}
