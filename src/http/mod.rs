//! HTTP transport module
//!
//! The pagination engine depends on HTTP only through the [`Transport`]
//! trait. This module defines that boundary and ships a reqwest-backed
//! implementation.
//!
//! # Features
//!
//! - **Transport Trait**: One async `execute` call per page
//! - **Reqwest Transport**: Timeout, user agent and default headers
//! - **Status Policy**: Regex rules mapping status codes to success/fail/stop

mod client;
mod policy;
mod transport;

pub use client::{ReqwestTransport, TransportConfig, TransportConfigBuilder};
pub use policy::HttpErrorPolicy;
pub use transport::{RequestDescriptor, Response, Transport};

#[cfg(test)]
mod tests;
