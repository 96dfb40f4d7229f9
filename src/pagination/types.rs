//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::config::ParamLocation;
use crate::error::{Error, Result};
use crate::http::{RequestDescriptor, Response};
use crate::types::JsonValue;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::borrow::Cow;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available, this is the next request
    Continue(RequestDescriptor),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// The next request, if any
    pub fn request(&self) -> Option<&RequestDescriptor> {
        match self {
            Self::Continue(request) => Some(request),
            Self::Done => None,
        }
    }
}

/// Per-iterator pagination bookkeeping
///
/// Either a request is queued or the iteration is terminal, never both.
#[derive(Debug, Clone)]
pub struct PaginationState {
    next_request: Option<RequestDescriptor>,
    pages: u64,
    last_url: Option<String>,
    last_status: Option<u16>,
}

impl PaginationState {
    /// Create state with the first request queued
    pub fn new(first_request: RequestDescriptor) -> Self {
        Self {
            next_request: Some(first_request),
            pages: 0,
            last_url: None,
            last_status: None,
        }
    }

    /// The queued request, `None` once terminal
    pub fn next_request(&self) -> Option<&RequestDescriptor> {
        self.next_request.as_ref()
    }

    /// Whether iteration has ended
    pub fn is_terminal(&self) -> bool {
        self.next_request.is_none()
    }

    /// Number of pages fetched so far
    pub fn pages(&self) -> u64 {
        self.pages
    }

    /// URL of the last page fetched
    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    /// Status of the last page fetched
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// Record a fetched page and queue what comes next
    pub(crate) fn advance(&mut self, fetched: &RequestDescriptor, status: u16, next: NextPage) {
        self.pages += 1;
        self.last_url = Some(fetched.url.clone());
        self.last_status = Some(status);
        self.next_request = match next {
            NextPage::Continue(request) => Some(request),
            NextPage::Done => None,
        };
    }
}

/// One fetched page, handed to the caller for parsing
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number within the scan
    pub number: u64,
    /// URL the page was fetched from
    pub url: String,
    /// Response status
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Bytes,
}

impl Page {
    pub(crate) fn new(number: u64, url: String, response: Response) -> Self {
        Self {
            number,
            url,
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body parsed as JSON
    pub fn json(&self) -> Result<JsonValue> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::malformed(format!("page {} is not valid JSON: {e}", self.number)))
    }

    /// Whether the page carries no records (see [`is_empty_body`])
    pub fn is_empty(&self, results_path: Option<&str>) -> bool {
        is_empty_body(&self.body, results_path)
    }
}

// ============================================================================
// Body Helpers
// ============================================================================

/// Whether a response body carries no records
///
/// A whitespace-only body is empty. A JSON body is empty when the value at
/// `results_path` (or the whole body) is missing, `null`, or an empty array.
/// Bodies that are not JSON but have content are treated as non-empty.
pub fn is_empty_body(body: &[u8], results_path: Option<&str>) -> bool {
    if body.iter().all(u8::is_ascii_whitespace) {
        return true;
    }

    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return false;
    };

    let records = match results_path {
        Some(path) => extract_path(&value, path),
        None => Some(value),
    };

    match records {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// One step of a body path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element, negative counts from the end
    Index(i64),
}

/// Parse a dot path into segments
///
/// Accepts `$` for the root, an optional `$.` prefix, dot-separated keys and
/// any number of `[n]` indices after a key (`data[0][1]`, `items[-1]`).
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let invalid =
        |reason: String| Error::invalid_config(format!("invalid body path '{path}': {reason}"));

    if path == "$" {
        return Ok(Vec::new());
    }
    let rest = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$').filter(|r| r.starts_with('[')))
        .unwrap_or(path);
    if rest.is_empty() {
        return Err(invalid("path is empty".to_string()));
    }

    let mut segments = Vec::new();
    for part in rest.split('.') {
        let (key, mut indices) = part.find('[').map_or((part, ""), |pos| part.split_at(pos));
        if key.contains(']') {
            return Err(invalid(format!("unbalanced ']' in '{part}'")));
        }
        if key.is_empty() && indices.is_empty() {
            return Err(invalid("empty key".to_string()));
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }

        while let Some(inner) = indices.strip_prefix('[') {
            let Some(end) = inner.find(']') else {
                return Err(invalid(format!("missing ']' in '{part}'")));
            };
            let raw = &inner[..end];
            let index = raw
                .parse::<i64>()
                .map_err(|_| invalid(format!("index '{raw}' is not an integer")))?;
            segments.push(PathSegment::Index(index));
            indices = &inner[end + 1..];
        }
        if !indices.is_empty() {
            return Err(invalid(format!("unexpected '{indices}' after an index")));
        }
    }

    Ok(segments)
}

/// Check a body path at construction time
///
/// Paths with `*` are checked by jsonpath-rust, everything else by
/// [`parse_path`].
pub fn check_path(path: &str) -> Result<()> {
    if path.contains('*') {
        use jsonpath_rust::JsonPath;

        return JsonPath::<Value>::try_from(path)
            .map(drop)
            .map_err(|e| Error::invalid_config(format!("invalid body path '{path}': {e}")));
    }
    parse_path(path).map(drop)
}

/// Extract a value by path
///
/// Supports the paths accepted by [`parse_path`]. Paths with `*` go through
/// jsonpath-rust. A path that does not parse extracts nothing; the factory
/// rejects such paths before any request is sent.
pub fn extract_path(value: &Value, path: &str) -> Option<Value> {
    if path.contains('*') {
        return extract_with_jsonpath(value, path);
    }

    let segments = parse_path(path).ok()?;
    let mut current = value;
    for segment in &segments {
        current = match segment {
            PathSegment::Key(key) => current.get(key.as_str())?,
            PathSegment::Index(index) => {
                let Value::Array(arr) = current else {
                    return None;
                };
                let idx = if *index < 0 {
                    i64::try_from(arr.len()).ok()? + index
                } else {
                    *index
                };
                arr.get(usize::try_from(idx).ok()?)?
            }
        };
    }

    Some(current.clone())
}

fn extract_with_jsonpath(value: &Value, path: &str) -> Option<Value> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).ok()?;
    match jp.find(value) {
        Value::Null => None,
        Value::Array(mut arr) if arr.len() == 1 => arr.pop(),
        Value::Array(arr) if arr.is_empty() => None,
        other => Some(other),
    }
}

/// Extract a scalar pagination value (link or token) from a body
///
/// Missing, `null`, and empty strings are absent (`Ok(None)`). Numbers and
/// booleans are stringified. Objects and arrays are malformed.
pub fn extract_scalar(body: &Value, path: &str) -> Result<Option<String>> {
    match extract_path(body, path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(Error::malformed(format!(
            "expected a string at '{path}', found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Request Helpers
// ============================================================================

/// Resolve a next link against the URL that produced it
pub fn resolve_link(current_url: &str, link: &str) -> Result<String> {
    let base = url::Url::parse(current_url)?;
    base.join(link.trim())
        .map(String::from)
        .map_err(|e| Error::malformed(format!("next link '{link}' is not a valid URL: {e}")))
}

/// Place a pagination value into a request
///
/// Query parameters replace an existing parameter of the same name and leave
/// the rest of the query string as written. Header values must be valid
/// header bytes, otherwise the value is malformed. Body injection needs a
/// JSON object body (or no body at all).
pub fn inject_param(
    request: &RequestDescriptor,
    location: ParamLocation,
    name: &str,
    value: &str,
) -> Result<RequestDescriptor> {
    let mut next = request.clone();
    match location {
        ParamLocation::Query => {
            let mut url = url::Url::parse(&request.url)?;
            // Other pairs are kept byte for byte, only `name` is re-encoded
            let mut pairs: Vec<String> = url
                .query()
                .unwrap_or_default()
                .split('&')
                .filter(|pair| {
                    !pair.is_empty()
                        && !url::form_urlencoded::parse(pair.as_bytes())
                            .next()
                            .is_some_and(|(key, _)| key == name)
                })
                .map(str::to_string)
                .collect();
            pairs.push(
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(name, value)
                    .finish(),
            );
            url.set_query(Some(&pairs.join("&")));
            next.url = url.into();
        }
        ParamLocation::Header => {
            HeaderValue::from_str(value).map_err(|_| {
                Error::malformed(format!(
                    "pagination value '{}' cannot be sent in header '{name}'",
                    value.escape_debug()
                ))
            })?;
            next.set_header(name, value);
        }
        ParamLocation::Body => {
            let mut body = match request.body.as_deref().map(str::trim) {
                None | Some("") => serde_json::Map::new(),
                Some(raw) => match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(map)) => map,
                    _ => {
                        return Err(Error::invalid_config(
                            "pagination location 'body' needs a JSON object request body",
                        ))
                    }
                },
            };
            body.insert(name.to_string(), Value::String(value.to_string()));
            next.body = Some(Value::Object(body).to_string());
        }
        ParamLocation::Url => {
            return Err(Error::invalid_config(
                "pagination location 'url' is rendered from the URL template, not injected",
            ));
        }
    }
    Ok(next)
}

/// Parse an RFC 8288 `Link` header value and return the URL for `target_rel`
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // <url>; rel="next", <url>; rel="prev"
    for part in header.split(',') {
        let mut url = None;
        let mut rels = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some((key, val)) = segment.split_once('=') {
                if key.trim().eq_ignore_ascii_case("rel") {
                    rels = Some(val.trim().trim_matches('"').trim_matches('\''));
                }
            }
        }

        if let (Some(u), Some(r)) = (url, rels) {
            // rel may hold several space-separated relation types
            if r.split_whitespace()
                .any(|rel| rel.eq_ignore_ascii_case(target_rel))
            {
                return Some(u.to_string());
            }
        }
    }

    None
}
