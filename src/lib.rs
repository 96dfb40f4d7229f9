// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # http-paginate
//!
//! Pagination engine for HTTP endpoints. Given a source description (URL,
//! method, headers, body and a pagination convention) it walks every page of
//! a logical request, one HTTP call per `next()`, and hands back the raw
//! pages for the caller to parse.
//!
//! ## Features
//!
//! - **Six pagination conventions**: none, link in header, link in body,
//!   token in body, incrementing index, custom expression
//! - **Pluggable transport**: anything implementing [`http::Transport`];
//!   a reqwest implementation ships with the crate
//! - **YAML/JSON configuration** with validation before any network call
//! - **Status policies**: map status codes to success, fail or stop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http_paginate::{load_config, PaginationIteratorFactory, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Arc::new(load_config("github-issues.yaml")?);
//!     let mut pages = PaginationIteratorFactory::create_with_reqwest(config)?;
//!
//!     while pages.has_next() {
//!         let page = pages.next().await?;
//!         // Parse page.body
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              PaginationIteratorFactory::create               │
//! │        SourceConfig + Transport → PaginationIterator         │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬──────────────────┴──────┬──────────────┬─────────┐
//! │  Config  │       Pagination        │     HTTP     │ Template│
//! ├──────────┼─────────────────────────┼──────────────┼─────────┤
//! │ YAML     │ None      Link (header) │ Transport    │ vars.*  │
//! │ JSON     │ Token     Link (body)   │ reqwest      │ index   │
//! │ Validate │ Index     Custom        │ Status rules │         │
//! └──────────┴─────────────────────────┴──────────────┴─────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Source configuration
pub mod config;

/// Template interpolation
pub mod template;

/// Transport contract and reqwest transport
pub mod http;

/// Pagination strategies and iterator
pub mod pagination;

/// YAML/JSON config loader
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{
    HttpErrorAction, HttpErrorRule, PaginationConfig, PaginationType, ParamLocation, SourceConfig,
};
pub use http::{ReqwestTransport, RequestDescriptor, Response, Transport};
pub use loader::{load_config, load_config_from_str, ConfigFormat};
pub use pagination::{Page, PaginationIterator, PaginationIteratorFactory};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
