//! Pagination module
//!
//! Supports: None, Link In Response Header, Link In Response Body,
//! Token In Response Body, Increment An Index, Custom
//!
//! # Overview
//!
//! A [`PaginationIterator`] walks every page of one logical request. The
//! factory picks the strategy from the source config; each strategy only
//! decides what the next request looks like, so parsing of the page records
//! is left entirely to the caller.
//!
//! ```no_run
//! use http_paginate::{PaginationConfig, PaginationIteratorFactory, SourceConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> http_paginate::Result<()> {
//! let config = SourceConfig::new("https://api.example.com/items")
//!     .with_pagination(PaginationConfig::link_in_body("links.next"));
//! let mut pages = PaginationIteratorFactory::create_with_reqwest(Arc::new(config))?;
//!
//! while pages.has_next() {
//!     let page = pages.next().await?;
//!     println!("page {}: {} bytes", page.number, page.body.len());
//! }
//! # Ok(())
//! # }
//! ```

mod custom;
mod iterator;
mod strategies;
mod types;

pub use custom::{ExpressionOutcome, PaginationExpression};
pub use iterator::{PaginationIterator, PaginationIteratorFactory};
pub use strategies::{
    CustomPaginator, IndexIncrementPaginator, LinkInBodyPaginator, LinkInHeaderPaginator,
    NonePaginator, PaginationStrategy, Paginator, TokenInBodyPaginator,
};
pub use types::{
    check_path, extract_path, extract_scalar, inject_param, is_empty_body, parse_link_header,
    parse_path, resolve_link, NextPage, Page, PaginationState, PathSegment,
};
