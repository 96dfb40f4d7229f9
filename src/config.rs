//! Source configuration
//!
//! Describes the target API (URL, method, headers, body) and which pagination
//! convention it uses. Loaded from YAML or JSON by the [`crate::loader`]
//! module and shared read-only (behind an `Arc`) by every iterator built
//! from it.

use crate::error::{Error, Result};
use crate::types::{Method, StringMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Pagination Type
// ============================================================================

/// The closed set of supported pagination conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaginationType {
    /// Single request, no pagination
    None,
    /// Next URL carried in a response header
    LinkInResponseHeader,
    /// Next URL carried in the response body
    LinkInResponseBody,
    /// Opaque continuation token in the response body
    TokenInResponseBody,
    /// Numeric index walked by a fixed step
    IncrementAnIndex,
    /// User-supplied expression decides the next request
    Custom,
}

impl PaginationType {
    /// All pagination types, in declaration order
    pub const ALL: [PaginationType; 6] = [
        PaginationType::None,
        PaginationType::LinkInResponseHeader,
        PaginationType::LinkInResponseBody,
        PaginationType::TokenInResponseBody,
        PaginationType::IncrementAnIndex,
        PaginationType::Custom,
    ];

    /// Wire name (e.g. `LINK_IN_RESPONSE_HEADER`)
    pub fn as_str(&self) -> &'static str {
        match self {
            PaginationType::None => "NONE",
            PaginationType::LinkInResponseHeader => "LINK_IN_RESPONSE_HEADER",
            PaginationType::LinkInResponseBody => "LINK_IN_RESPONSE_BODY",
            PaginationType::TokenInResponseBody => "TOKEN_IN_RESPONSE_BODY",
            PaginationType::IncrementAnIndex => "INCREMENT_AN_INDEX",
            PaginationType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for PaginationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaginationType {
    type Err = Error;

    /// Accepts wire names and UI labels alike: `INCREMENT_AN_INDEX`,
    /// `increment-an-index` and `Increment an index` all parse.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        PaginationType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| Error::invalid_config(format!("Unsupported pagination type: '{s}'")))
    }
}

// ============================================================================
// Parameter Location
// ============================================================================

/// Where a pagination value is injected into the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// Query string parameter (replaces an existing one with the same name)
    #[default]
    Query,
    /// Request header
    Header,
    /// Top-level field of a JSON request body
    Body,
    /// `{{ pagination.index }}` placeholder in the URL (index pagination only)
    Url,
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Strategy-specific pagination parameters, tagged by `type`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaginationConfig {
    /// No pagination
    #[default]
    None,

    /// Next URL in a response header
    LinkInResponseHeader {
        /// Header carrying the next link (case-insensitive)
        #[serde(default = "default_link_header")]
        header: String,
        /// Relation to follow when the header is RFC 8288 formatted
        #[serde(default = "default_link_rel")]
        rel: String,
    },

    /// Next URL in the response body
    LinkInResponseBody {
        /// Path to the next URL field (e.g. `links.next`)
        next_page_path: String,
    },

    /// Continuation token in the response body
    TokenInResponseBody {
        /// Path to the token field
        token_path: String,
        /// Name of the request parameter carrying the token
        param: String,
        /// Where the token goes in the next request
        #[serde(default)]
        location: ParamLocation,
    },

    /// Incrementing numeric index
    IncrementAnIndex {
        /// Name of the request parameter carrying the index
        #[serde(default)]
        param: String,
        /// Where the index goes in the request
        #[serde(default)]
        location: ParamLocation,
        /// First index value
        #[serde(default)]
        start: u64,
        /// Increment applied after every page
        #[serde(default = "default_step")]
        step: u64,
        /// Largest index requested (inclusive)
        #[serde(default)]
        max: Option<u64>,
        /// Stop as soon as a page comes back empty
        #[serde(default = "default_true")]
        stop_on_empty_page: bool,
    },

    /// Expression evaluated against every response
    Custom {
        /// minijinja expression producing the next URL or request
        expression: String,
    },
}

fn default_link_header() -> String {
    "Link".to_string()
}

fn default_link_rel() -> String {
    "next".to_string()
}

fn default_step() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

impl PaginationConfig {
    /// Create link-in-header pagination config
    pub fn link_in_header(header: impl Into<String>) -> Self {
        Self::LinkInResponseHeader {
            header: header.into(),
            rel: default_link_rel(),
        }
    }

    /// Create link-in-body pagination config
    pub fn link_in_body(next_page_path: impl Into<String>) -> Self {
        Self::LinkInResponseBody {
            next_page_path: next_page_path.into(),
        }
    }

    /// Create token-in-body pagination config
    pub fn token_in_body(
        token_path: impl Into<String>,
        param: impl Into<String>,
        location: ParamLocation,
    ) -> Self {
        Self::TokenInResponseBody {
            token_path: token_path.into(),
            param: param.into(),
            location,
        }
    }

    /// Create index pagination config
    pub fn increment_index(param: impl Into<String>, start: u64, step: u64, max: Option<u64>) -> Self {
        Self::IncrementAnIndex {
            param: param.into(),
            location: ParamLocation::Query,
            start,
            step,
            max,
            stop_on_empty_page: true,
        }
    }

    /// Create custom pagination config
    pub fn custom(expression: impl Into<String>) -> Self {
        Self::Custom {
            expression: expression.into(),
        }
    }

    /// The pagination type selector for this config
    pub fn pagination_type(&self) -> PaginationType {
        match self {
            Self::None => PaginationType::None,
            Self::LinkInResponseHeader { .. } => PaginationType::LinkInResponseHeader,
            Self::LinkInResponseBody { .. } => PaginationType::LinkInResponseBody,
            Self::TokenInResponseBody { .. } => PaginationType::TokenInResponseBody,
            Self::IncrementAnIndex { .. } => PaginationType::IncrementAnIndex,
            Self::Custom { .. } => PaginationType::Custom,
        }
    }

    fn collect_errors(&self, errors: &mut Vec<String>) {
        match self {
            Self::None => {}
            Self::LinkInResponseHeader { header, rel } => {
                if header.trim().is_empty() {
                    errors.push("pagination.header must not be empty".to_string());
                }
                if rel.trim().is_empty() {
                    errors.push("pagination.rel must not be empty".to_string());
                }
            }
            Self::LinkInResponseBody { next_page_path } => {
                if next_page_path.trim().is_empty() {
                    errors.push("pagination.next_page_path must not be empty".to_string());
                }
            }
            Self::TokenInResponseBody {
                token_path,
                param,
                location,
            } => {
                if token_path.trim().is_empty() {
                    errors.push("pagination.token_path must not be empty".to_string());
                }
                if param.trim().is_empty() {
                    errors.push("pagination.param must not be empty".to_string());
                }
                if *location == ParamLocation::Url {
                    errors.push(
                        "pagination.location 'url' is only supported for INCREMENT_AN_INDEX"
                            .to_string(),
                    );
                }
            }
            Self::IncrementAnIndex {
                param,
                location,
                start,
                step,
                max,
                ..
            } => {
                if *location != ParamLocation::Url && param.trim().is_empty() {
                    errors.push("pagination.param must not be empty".to_string());
                }
                if *step == 0 {
                    errors.push("pagination.step must be greater than 0".to_string());
                }
                if let Some(max) = max {
                    if max < start {
                        errors.push(format!(
                            "pagination.max ({max}) must not be less than pagination.start ({start})"
                        ));
                    }
                }
            }
            Self::Custom { expression } => {
                if expression.trim().is_empty() {
                    errors.push("pagination.expression must not be empty".to_string());
                }
            }
        }
    }
}

// ============================================================================
// HTTP Error Rules
// ============================================================================

/// What to do with a response whose status matches a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpErrorAction {
    /// Treat as a normal page
    Success,
    /// Fail the `next()` call
    Fail,
    /// Return the page and end pagination
    Stop,
}

/// Maps status codes (regex over the decimal code) to an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorRule {
    /// Regex matched against the whole status code, e.g. `4..` or `404|410`
    pub status: String,
    /// Action for matching responses
    pub action: HttpErrorAction,
}

impl HttpErrorRule {
    /// Create a new rule
    pub fn new(status: impl Into<String>, action: HttpErrorAction) -> Self {
        Self {
            status: status.into(),
            action,
        }
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// Immutable description of a paginated HTTP source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the first page (may contain `{{ vars.* }}` templates)
    pub url: String,

    /// HTTP method
    #[serde(default)]
    pub method: Method,

    /// Static request headers
    #[serde(default)]
    pub headers: StringMap,

    /// Request body template
    #[serde(default)]
    pub body: Option<String>,

    /// User variables available to templates and custom expressions
    #[serde(default)]
    pub vars: StringMap,

    /// Path to the records array, used for empty-page detection
    #[serde(default)]
    pub results_path: Option<String>,

    /// Delay before every request after the first
    #[serde(default)]
    pub wait_between_pages_ms: u64,

    /// Status handling rules, first match wins
    #[serde(default)]
    pub http_errors: Vec<HttpErrorRule>,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport user agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Pagination strategy
    #[serde(default)]
    pub pagination: PaginationConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl SourceConfig {
    /// Create a GET source with no pagination
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: StringMap::new(),
            body: None,
            vars: StringMap::new(),
            results_path: None,
            wait_between_pages_ms: 0,
            http_errors: Vec::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            pagination: PaginationConfig::None,
        }
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a static header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a template variable
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the records path
    #[must_use]
    pub fn with_results_path(mut self, path: impl Into<String>) -> Self {
        self.results_path = Some(path.into());
        self
    }

    /// Add a status handling rule
    #[must_use]
    pub fn with_http_error(mut self, status: impl Into<String>, action: HttpErrorAction) -> Self {
        self.http_errors.push(HttpErrorRule::new(status, action));
        self
    }

    /// Set the delay between pages
    #[must_use]
    pub fn with_wait_between_pages_ms(mut self, millis: u64) -> Self {
        self.wait_between_pages_ms = millis;
        self
    }

    /// The configured pagination type
    pub fn pagination_type(&self) -> PaginationType {
        self.pagination.pagination_type()
    }

    /// Check the config, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let url = self.url.trim();
        if url.is_empty() {
            errors.push("url must not be empty".to_string());
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("url must start with http:// or https://, got '{url}'"));
        }

        if self.timeout_secs == 0 {
            errors.push("timeout_secs must be greater than 0".to_string());
        }

        for rule in &self.http_errors {
            if rule.status.trim().is_empty() {
                errors.push("http_errors[].status must not be empty".to_string());
            }
        }

        self.pagination.collect_errors(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_config(errors.join("; ")))
        }
    }
}
