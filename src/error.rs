//! Error types for http-paginate
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for http-paginate
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    TransportFailure(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Pagination is terminated after {pages} page(s), no request is queued")]
    TerminatedIteration { pages: u64 },

    #[error("Pagination expression failed: {message}")]
    ExpressionEvaluation { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an expression evaluation error
    pub fn expression(message: impl Into<String>) -> Self {
        Self::ExpressionEvaluation {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Check if this error came from the transport layer
    ///
    /// The pagination engine never retries these; callers that want retries
    /// can call `next()` again since the queued request is left in place.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::TransportFailure(_) | Error::HttpStatus { .. } | Error::Timeout { .. }
        )
    }

    /// Check if this error is a caller protocol violation
    pub fn is_terminated(&self) -> bool {
        matches!(self, Error::TerminatedIteration { .. })
    }
}

/// Result type alias for http-paginate
pub type Result<T> = std::result::Result<T, Error>;
