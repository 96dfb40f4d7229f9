//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Walk paginated HTTP endpoints
#[derive(Parser, Debug)]
#[command(name = "http-paginate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of a source
    Fetch {
        /// Source config file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u64>,
    },

    /// Validate a source config
    Validate {
        /// Source config file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
