//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::error::Result;
use crate::loader::load_config;
use crate::pagination::{extract_path, Page, PaginationIteratorFactory};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch { config, max_pages } => self.fetch(config, *max_pages).await,
            Commands::Validate { config } => self.validate(config),
        }
    }

    /// Walk every page of a source
    async fn fetch(&self, path: &Path, max_pages: Option<u64>) -> Result<()> {
        let config = Arc::new(load_config(path)?);
        let mut pages = PaginationIteratorFactory::create_with_reqwest(Arc::clone(&config))?;

        info!(
            "Fetching {} with {} pagination",
            config.url,
            config.pagination_type()
        );

        let start = Instant::now();
        let mut total_bytes = 0;
        let mut truncated = false;

        while pages.has_next() {
            if max_pages.is_some_and(|max| pages.page_count() >= max) {
                truncated = true;
                break;
            }

            let page = pages.next().await?;
            total_bytes += page.body.len();
            self.output_message(&page_message(&page, &config));
        }

        self.output_message(&json!({
            "type": "SUMMARY",
            "summary": {
                "pages": pages.page_count(),
                "bytes": total_bytes,
                "truncated": truncated,
                "elapsed_ms": u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            }
        }));

        Ok(())
    }

    /// Validate a source config
    ///
    /// Builds the iterator the way `fetch` does, so expressions, placeholders
    /// and parameter placement are checked too. No request is sent.
    fn validate(&self, path: &Path) -> Result<()> {
        let config = Arc::new(load_config(path)?);
        PaginationIteratorFactory::create_with_reqwest(Arc::clone(&config))?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Source '{}' is valid with {} pagination",
                    config.url,
                    config.pagination_type()
                )
            }
        }));

        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Build the PAGE message printed for a fetched page
///
/// JSON bodies are embedded as-is, anything else as text. `records` counts
/// the array at `results_path` (or the body itself) when there is one.
pub(crate) fn page_message(page: &Page, config: &SourceConfig) -> Value {
    let body = page
        .json()
        .unwrap_or_else(|_| Value::String(page.text().into_owned()));

    let records = match config.results_path.as_deref() {
        Some(path) => extract_path(&body, path),
        None => Some(body.clone()),
    }
    .and_then(|v| v.as_array().map(Vec::len));

    json!({
        "type": "PAGE",
        "page": {
            "number": page.number,
            "status": page.status,
            "url": page.url,
            "records": records,
            "body": body,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::error::Error;
    use clap::Parser;
    use reqwest::header::HeaderMap;
    use std::io::Write;

    fn page(body: &str) -> Page {
        Page::new(
            2,
            "https://api.example.com/items?page=2".to_string(),
            Response::new(200, HeaderMap::new(), body.to_string()),
        )
    }

    #[test]
    fn test_parse_fetch_command() {
        let cli = Cli::try_parse_from([
            "http-paginate",
            "fetch",
            "--config",
            "source.yaml",
            "--max-pages",
            "3",
            "--format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Pretty);
        match cli.command {
            Commands::Fetch { config, max_pages } => {
                assert_eq!(config, Path::new("source.yaml"));
                assert_eq!(max_pages, Some(3));
            }
            Commands::Validate { .. } => panic!("Expected Fetch"),
        }
    }

    #[test]
    fn test_parse_requires_config() {
        assert!(Cli::try_parse_from(["http-paginate", "validate"]).is_err());
    }

    fn validate_file(yaml: &str) -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let cli = Cli::try_parse_from([
            "http-paginate",
            "validate",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        Runner::new(cli).validate(file.path())
    }

    #[test]
    fn test_validate_accepts_buildable_source() {
        let yaml = r#"
url: "https://api.example.com/items"
pagination:
  type: CUSTOM
  expression: "body.next"
"#;
        assert!(validate_file(yaml).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_expression() {
        let yaml = r#"
url: "https://api.example.com/items"
pagination:
  type: CUSTOM
  expression: "body.next =="
"#;
        let err = validate_file(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("invalid pagination expression"));
    }

    #[test]
    fn test_validate_rejects_missing_index_placeholder() {
        let yaml = r#"
url: "https://api.example.com/items"
pagination:
  type: INCREMENT_AN_INDEX
  location: url
"#;
        let err = validate_file(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_page_message_json_body() {
        let config = SourceConfig::new("https://api.example.com/items").with_results_path("data");
        let msg = page_message(&page(r#"{"data": [1, 2, 3]}"#), &config);

        assert_eq!(msg["type"], "PAGE");
        assert_eq!(msg["page"]["number"], 2);
        assert_eq!(msg["page"]["status"], 200);
        assert_eq!(msg["page"]["records"], 3);
        assert_eq!(msg["page"]["body"]["data"][0], 1);
    }

    #[test]
    fn test_page_message_text_body() {
        let config = SourceConfig::new("https://api.example.com/items");
        let msg = page_message(&page("id,name\n1,a\n"), &config);

        assert_eq!(msg["page"]["body"], "id,name\n1,a\n");
        assert!(msg["page"]["records"].is_null());
    }
}
