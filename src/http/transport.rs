//! Transport contract
//!
//! The pagination engine never talks to the network itself. It hands a
//! [`RequestDescriptor`] to a [`Transport`] and gets a [`Response`] back.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Request Descriptor
// ============================================================================

/// Fully specified HTTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, query string included
    pub url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Request body
    pub body: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor with no headers or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Copy of this request pointed at another URL
    #[must_use]
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }

    /// Set a header, replacing any existing one regardless of case
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Get a header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a query parameter in the URL, if present
    pub fn query_param(&self, name: &str) -> Option<String> {
        let url = url::Url::parse(&self.url).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

// ============================================================================
// Response
// ============================================================================

/// Raw HTTP response as returned by a transport
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a response
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// First value of a header, ignoring case
    ///
    /// Returns `Ok(None)` when the header is absent and an error when it is
    /// present but not valid visible ASCII.
    pub fn header(&self, name: &str) -> Result<Option<&str>> {
        match self.headers.get(name) {
            Some(value) => value.to_str().map(Some).map_err(|_| {
                Error::malformed(format!("header '{name}' is not valid ASCII"))
            }),
            None => Ok(None),
        }
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body parsed as JSON
    pub fn json(&self) -> Result<JsonValue> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::malformed(format!("response body is not valid JSON: {e}")))
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Performs one HTTP request
///
/// Timeouts and connection handling belong to the implementation; a
/// timeout must surface as an error, never as an empty response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request and return the raw response
    async fn execute(&self, request: &RequestDescriptor) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Response> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Response> {
        (**self).execute(request).await
    }
}
