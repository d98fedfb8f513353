use std::path::PathBuf;

use clap::Parser;

/// revwatch - keep a version of every change under a directory
#[derive(Parser, Debug)]
#[command(name = "revwatch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Versions are written to <ROOT>/versions/. Press Ctrl+C to stop.")]
pub struct Cli {
    /// Directory tree to watch
    pub root: PathBuf,

    /// Configuration file (default: <config dir>/revwatch/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit events as NDJSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
