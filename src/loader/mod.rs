//! Config loader module
//!
//! Reads [`SourceConfig`](crate::config::SourceConfig) documents from YAML or
//! JSON files and validates them before they reach the factory.

mod parser;

pub use parser::{load_config, load_config_from_str, ConfigFormat};

#[cfg(test)]
mod tests;
