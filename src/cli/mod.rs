//! CLI module
//!
//! Command-line interface for walking paginated endpoints.
//!
//! # Commands
//!
//! - `fetch` - Walk every page of a source and print each one
//! - `validate` - Check a source config without touching the network

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
