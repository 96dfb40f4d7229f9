//! Parser for source config files
//!
//! The format is picked from the file extension: `.yaml`/`.yml` for YAML,
//! `.json` for JSON. Anything else is rejected.

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Serialization format of a config document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML document
    Yaml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::invalid_config(format!(
                "Cannot tell the format of '{}', expected a .yaml, .yml or .json file",
                path.display()
            ))),
        }
    }
}

/// Load and validate a source config from a file
///
/// # Examples
///
/// ```ignore
/// let config = load_config("./github-issues.yaml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SourceConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    debug!("Loading {:?} config from {}", format, path.display());
    load_config_from_str(&content, format)
}

/// Load and validate a source config from text
pub fn load_config_from_str(text: &str, format: ConfigFormat) -> Result<SourceConfig> {
    let config: SourceConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config YAML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(text)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config JSON: {e}")))?,
    };

    config.validate()?;
    Ok(config)
}
