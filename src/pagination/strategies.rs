//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern. A strategy only
//! decides what the next request is; fetching and bookkeeping live in
//! [`super::PaginationIterator`].

use super::custom::{ExpressionOutcome, PaginationExpression};
use super::types::{
    extract_scalar, inject_param, is_empty_body, parse_link_header, resolve_link, NextPage,
};
use crate::config::{PaginationType, ParamLocation};
use crate::error::Result;
use crate::http::{RequestDescriptor, Response};
use crate::template::{self, TemplateContext};
use crate::types::JsonValue;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// The first request of a scan
    fn first_request(&self, base: &RequestDescriptor) -> Result<RequestDescriptor> {
        Ok(base.clone())
    }

    /// Decide the request that follows `request`, given its response
    ///
    /// Must not change any state when returning an error.
    fn process_response(
        &mut self,
        request: &RequestDescriptor,
        response: &Response,
        page: u64,
    ) -> Result<NextPage>;
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NonePaginator;

impl Paginator for NonePaginator {
    fn process_response(
        &mut self,
        _request: &RequestDescriptor,
        _response: &Response,
        _page: u64,
    ) -> Result<NextPage> {
        Ok(NextPage::Done)
    }
}

// ============================================================================
// Link In Response Header
// ============================================================================

/// Next URL carried in a response header
///
/// The header value is either the URL itself or an RFC 8288 list:
/// `Link: <https://api.github.com/...?page=2>; rel="next", ...`
#[derive(Debug, Clone)]
pub struct LinkInHeaderPaginator {
    /// Header to read (case-insensitive)
    pub header: String,
    /// Relation to follow in RFC 8288 values
    pub rel: String,
}

impl Default for LinkInHeaderPaginator {
    fn default() -> Self {
        Self::new("Link")
    }
}

impl LinkInHeaderPaginator {
    /// Create a new link header paginator following `rel="next"`
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            rel: "next".to_string(),
        }
    }

    /// Follow a different relation
    #[must_use]
    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = rel.into();
        self
    }
}

impl Paginator for LinkInHeaderPaginator {
    fn process_response(
        &mut self,
        request: &RequestDescriptor,
        response: &Response,
        _page: u64,
    ) -> Result<NextPage> {
        let value = match response.header(&self.header)? {
            Some(value) if !value.trim().is_empty() => value.trim(),
            _ => {
                debug!("No '{}' header in response, last page", self.header);
                return Ok(NextPage::Done);
            }
        };

        let link = if value.starts_with('<') {
            match parse_link_header(value, &self.rel) {
                Some(link) => link,
                None => {
                    debug!("'{}' header has no rel=\"{}\" entry", self.header, self.rel);
                    return Ok(NextPage::Done);
                }
            }
        } else {
            value.to_string()
        };

        let next_url = resolve_link(&request.url, &link)?;
        Ok(NextPage::Continue(request.with_url(next_url)))
    }
}

// ============================================================================
// Link In Response Body
// ============================================================================

/// Next URL in response body
///
/// Common patterns:
/// - `{ "next": "https://api.example.com/items?page=2" }`
/// - `{ "pagination": { "next_url": "..." } }`
#[derive(Debug, Clone)]
pub struct LinkInBodyPaginator {
    /// Path to the next URL in the response
    pub next_page_path: String,
}

impl LinkInBodyPaginator {
    /// Create a new link-in-body paginator
    pub fn new(next_page_path: impl Into<String>) -> Self {
        Self {
            next_page_path: next_page_path.into(),
        }
    }
}

impl Paginator for LinkInBodyPaginator {
    fn process_response(
        &mut self,
        request: &RequestDescriptor,
        response: &Response,
        _page: u64,
    ) -> Result<NextPage> {
        let body = response.json()?;

        match extract_scalar(&body, &self.next_page_path)? {
            Some(link) => {
                let next_url = resolve_link(&request.url, &link)?;
                Ok(NextPage::Continue(request.with_url(next_url)))
            }
            None => {
                debug!("'{}' is empty, last page", self.next_page_path);
                Ok(NextPage::Done)
            }
        }
    }
}

// ============================================================================
// Token In Response Body
// ============================================================================

/// Continuation token in the response body (e.g. Stripe, Slack)
///
/// The token is re-injected into the original request:
/// - `?page_token=abc123`
/// - `X-Continuation: abc123`
/// - `{"cursor": "abc123", ...}`
#[derive(Debug, Clone)]
pub struct TokenInBodyPaginator {
    base: RequestDescriptor,
    /// Path to the token in the response
    pub token_path: String,
    /// Name of the request parameter carrying the token
    pub param: String,
    /// Where the token goes
    pub location: ParamLocation,
}

impl TokenInBodyPaginator {
    /// Create a new token paginator over a base request
    pub fn new(
        base: RequestDescriptor,
        token_path: impl Into<String>,
        param: impl Into<String>,
        location: ParamLocation,
    ) -> Self {
        Self {
            base,
            token_path: token_path.into(),
            param: param.into(),
            location,
        }
    }
}

impl Paginator for TokenInBodyPaginator {
    fn process_response(
        &mut self,
        _request: &RequestDescriptor,
        response: &Response,
        _page: u64,
    ) -> Result<NextPage> {
        let body = response.json()?;

        match extract_scalar(&body, &self.token_path)? {
            Some(token) => {
                let next = inject_param(&self.base, self.location, &self.param, &token)?;
                Ok(NextPage::Continue(next))
            }
            None => {
                debug!("No token at '{}', last page", self.token_path);
                Ok(NextPage::Done)
            }
        }
    }
}

// ============================================================================
// Increment An Index
// ============================================================================

/// Numeric index walked by a fixed step
///
/// Blind walker: it never reads pagination metadata, it only stops on an
/// empty page or once the next index would pass `max`.
#[derive(Debug, Clone)]
pub struct IndexIncrementPaginator {
    base: RequestDescriptor,
    /// Name of the request parameter carrying the index
    pub param: String,
    /// Where the index goes
    pub location: ParamLocation,
    /// First index
    pub start: u64,
    /// Increment per page
    pub step: u64,
    /// Largest index requested (inclusive)
    pub max: Option<u64>,
    /// Stop when a page is empty
    pub stop_on_empty_page: bool,
    /// Records path used for the emptiness check
    pub results_path: Option<String>,
    current: u64,
}

impl IndexIncrementPaginator {
    /// Create a new index paginator over a base request
    ///
    /// With [`ParamLocation::Url`] the base URL must hold a
    /// `{{ pagination.index }}` placeholder.
    pub fn new(
        base: RequestDescriptor,
        param: impl Into<String>,
        location: ParamLocation,
        start: u64,
        step: u64,
    ) -> Self {
        Self {
            base,
            param: param.into(),
            location,
            start,
            step,
            max: None,
            stop_on_empty_page: true,
            results_path: None,
            current: start,
        }
    }

    /// Set the inclusive maximum index
    #[must_use]
    pub fn with_max(mut self, max: Option<u64>) -> Self {
        self.max = max;
        self
    }

    /// Configure empty-page detection
    #[must_use]
    pub fn with_empty_page_stop(mut self, enabled: bool, results_path: Option<String>) -> Self {
        self.stop_on_empty_page = enabled;
        self.results_path = results_path;
        self
    }

    /// Index of the most recently queued request
    pub fn current_index(&self) -> u64 {
        self.current
    }

    fn request_for(&self, index: u64) -> Result<RequestDescriptor> {
        match self.location {
            ParamLocation::Url => {
                let mut ctx = TemplateContext::new();
                ctx.set_pagination(json!({ "index": index }));
                let url = template::render(&self.base.url, &ctx)?;
                url::Url::parse(&url)?;
                Ok(self.base.with_url(url))
            }
            location => inject_param(&self.base, location, &self.param, &index.to_string()),
        }
    }
}

impl Paginator for IndexIncrementPaginator {
    fn first_request(&self, _base: &RequestDescriptor) -> Result<RequestDescriptor> {
        self.request_for(self.start)
    }

    fn process_response(
        &mut self,
        _request: &RequestDescriptor,
        response: &Response,
        _page: u64,
    ) -> Result<NextPage> {
        if self.stop_on_empty_page && is_empty_body(&response.body, self.results_path.as_deref())
        {
            debug!("Index {} returned an empty page, stopping", self.current);
            return Ok(NextPage::Done);
        }

        let Some(next) = self.current.checked_add(self.step) else {
            return Ok(NextPage::Done);
        };
        if self.max.is_some_and(|max| next > max) {
            debug!("Next index {next} passes the maximum, stopping");
            return Ok(NextPage::Done);
        }

        let request = self.request_for(next)?;
        self.current = next;
        Ok(NextPage::Continue(request))
    }
}

// ============================================================================
// Custom
// ============================================================================

/// Expression-driven pagination
#[derive(Debug)]
pub struct CustomPaginator {
    expression: PaginationExpression,
    vars: JsonValue,
}

impl CustomPaginator {
    /// Create a custom paginator from a compiled expression
    pub fn new(expression: PaginationExpression, vars: JsonValue) -> Self {
        Self { expression, vars }
    }

    /// Expression source text
    pub fn expression(&self) -> &str {
        self.expression.source()
    }

    fn context(&self, request: &RequestDescriptor, response: &Response, page: u64) -> JsonValue {
        // First value per name; bytes that are not UTF-8 become U+FFFD
        let mut headers = Map::new();
        for (name, value) in &response.headers {
            headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| {
                    Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned())
                });
        }

        json!({
            "url": request.url,
            "method": request.method.as_str(),
            "status": response.status,
            "headers": headers,
            "body": response.json().unwrap_or(Value::Null),
            "text": response.text(),
            "page": page,
            "vars": self.vars,
        })
    }
}

impl Paginator for CustomPaginator {
    fn process_response(
        &mut self,
        request: &RequestDescriptor,
        response: &Response,
        page: u64,
    ) -> Result<NextPage> {
        let context = self.context(request, response, page);

        match self.expression.evaluate(&context)? {
            ExpressionOutcome::Done => {
                debug!("Custom expression ended pagination after page {page}");
                Ok(NextPage::Done)
            }
            ExpressionOutcome::Url(url) => {
                let next_url = resolve_link(&request.url, &url)?;
                Ok(NextPage::Continue(request.with_url(next_url)))
            }
            ExpressionOutcome::Request {
                url,
                method,
                headers,
                body,
            } => {
                let mut next = request.with_url(resolve_link(&request.url, &url)?);
                if let Some(method) = method {
                    next.method = method;
                }
                for (name, value) in headers {
                    next.set_header(name, value);
                }
                if let Some(body) = body {
                    next.body = body;
                }
                Ok(NextPage::Continue(next))
            }
        }
    }
}

// ============================================================================
// Strategy Dispatch
// ============================================================================

/// The strategy chosen for a scan, resolved once by the factory
#[derive(Debug)]
pub enum PaginationStrategy {
    /// Single page
    None(NonePaginator),
    /// Next link in a header
    LinkInHeader(LinkInHeaderPaginator),
    /// Next link in the body
    LinkInBody(LinkInBodyPaginator),
    /// Continuation token in the body
    TokenInBody(TokenInBodyPaginator),
    /// Incrementing index
    IndexIncrement(IndexIncrementPaginator),
    /// User expression
    Custom(CustomPaginator),
}

impl PaginationStrategy {
    /// The pagination type this strategy implements
    pub fn pagination_type(&self) -> PaginationType {
        match self {
            Self::None(_) => PaginationType::None,
            Self::LinkInHeader(_) => PaginationType::LinkInResponseHeader,
            Self::LinkInBody(_) => PaginationType::LinkInResponseBody,
            Self::TokenInBody(_) => PaginationType::TokenInResponseBody,
            Self::IndexIncrement(_) => PaginationType::IncrementAnIndex,
            Self::Custom(_) => PaginationType::Custom,
        }
    }
}

impl Paginator for PaginationStrategy {
    fn first_request(&self, base: &RequestDescriptor) -> Result<RequestDescriptor> {
        match self {
            Self::None(p) => p.first_request(base),
            Self::LinkInHeader(p) => p.first_request(base),
            Self::LinkInBody(p) => p.first_request(base),
            Self::TokenInBody(p) => p.first_request(base),
            Self::IndexIncrement(p) => p.first_request(base),
            Self::Custom(p) => p.first_request(base),
        }
    }

    fn process_response(
        &mut self,
        request: &RequestDescriptor,
        response: &Response,
        page: u64,
    ) -> Result<NextPage> {
        match self {
            Self::None(p) => p.process_response(request, response, page),
            Self::LinkInHeader(p) => p.process_response(request, response, page),
            Self::LinkInBody(p) => p.process_response(request, response, page),
            Self::TokenInBody(p) => p.process_response(request, response, page),
            Self::IndexIncrement(p) => p.process_response(request, response, page),
            Self::Custom(p) => p.process_response(request, response, page),
        }
    }
}
