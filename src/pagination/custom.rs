//! Custom pagination expressions
//!
//! A CUSTOM source carries a minijinja expression that is evaluated after
//! every page. Its result decides the next request:
//!
//! - `none`, undefined, `false` or an empty string: no more pages
//! - a string: URL of the next page (relative URLs are resolved)
//! - a map with `url` and optional `method`, `headers`, `body`: a full request
//!
//! ```text
//! body.links.next
//! {"url": body.next, "headers": {"X-Page": page + 1}} if body.next else none
//! ```
//!
//! The expression sees `url`, `method`, `status`, `headers`, `body`, `text`,
//! `page` and `vars`. `headers` maps each lower-cased name to its first
//! value, decoded lossily when it is not UTF-8.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use minijinja::{Environment, Expression, UndefinedBehavior};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Shared environment; chainable undefined lets `body.a.b` be none-safe
static ENVIRONMENT: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env
});

/// Keys accepted in a map result
const REQUEST_KEYS: [&str; 4] = ["url", "method", "headers", "body"];

/// What an expression decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionOutcome {
    /// No more pages
    Done,
    /// Same request shape, new URL
    Url(String),
    /// Explicit request parts; unset parts keep their current value
    Request {
        /// Next URL
        url: String,
        /// Method override
        method: Option<Method>,
        /// Headers merged over the current ones
        headers: BTreeMap<String, String>,
        /// Body override; `Some(None)` removes the body
        body: Option<Option<String>>,
    },
}

/// A compiled pagination expression
pub struct PaginationExpression {
    expr: Expression<'static, 'static>,
    source: String,
}

impl PaginationExpression {
    /// Compile an expression; syntax errors are configuration errors
    pub fn compile(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let expr = ENVIRONMENT
            .compile_expression_owned(source.clone())
            .map_err(|e| {
                Error::invalid_config(format!("invalid pagination expression '{source}': {e}"))
            })?;

        Ok(Self { expr, source })
    }

    /// Expression source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a JSON context object
    pub fn evaluate(&self, context: &JsonValue) -> Result<ExpressionOutcome> {
        let value = self
            .expr
            .eval(context)
            .map_err(|e| Error::expression(format!("'{}' failed: {e}", self.source)))?;

        if value.is_undefined() || value.is_none() {
            return Ok(ExpressionOutcome::Done);
        }

        let json = serde_json::to_value(&value)
            .map_err(|e| Error::expression(format!("result is not representable: {e}")))?;
        interpret(json)
    }
}

impl std::fmt::Debug for PaginationExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationExpression")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

fn interpret(result: Value) -> Result<ExpressionOutcome> {
    match result {
        Value::Null | Value::Bool(false) => Ok(ExpressionOutcome::Done),
        Value::String(url) if url.trim().is_empty() => Ok(ExpressionOutcome::Done),
        Value::String(url) => Ok(ExpressionOutcome::Url(url)),
        Value::Object(map) => interpret_request(map),
        other => Err(Error::expression(format!(
            "expected none, a URL string or a request map, got {other}"
        ))),
    }
}

fn interpret_request(map: serde_json::Map<String, Value>) -> Result<ExpressionOutcome> {
    if let Some(key) = map.keys().find(|k| !REQUEST_KEYS.contains(&k.as_str())) {
        return Err(Error::expression(format!(
            "unrecognized key '{key}' in request map (expected url, method, headers, body)"
        )));
    }

    let url = match map.get("url") {
        None => return Err(Error::expression("request map has no 'url' key")),
        Some(Value::Null) => return Ok(ExpressionOutcome::Done),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(ExpressionOutcome::Done),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(Error::expression(format!("'url' must be a string, got {other}")))
        }
    };

    let method = match map.get("method") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            Method::parse(s)
                .ok_or_else(|| Error::expression(format!("unsupported method '{s}'")))?,
        ),
        Some(other) => {
            return Err(Error::expression(format!(
                "'method' must be a string, got {other}"
            )))
        }
    };

    let mut headers = BTreeMap::new();
    match map.get("headers") {
        None | Some(Value::Null) => {}
        Some(Value::Object(entries)) => {
            for (name, value) in entries {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(Error::expression(format!(
                            "header '{name}' must be a scalar, got {other}"
                        )))
                    }
                };
                headers.insert(name.clone(), value);
            }
        }
        Some(other) => {
            return Err(Error::expression(format!(
                "'headers' must be a map, got {other}"
            )))
        }
    }

    let body = match map.get("body") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => Some(Some(other.to_string())),
    };

    Ok(ExpressionOutcome::Request {
        url,
        method,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval(source: &str, context: &JsonValue) -> Result<ExpressionOutcome> {
        PaginationExpression::compile(source)
            .unwrap()
            .evaluate(context)
    }

    #[test]
    fn test_compile_syntax_error() {
        let err = PaginationExpression::compile("body.next ==").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_string_result_is_url() {
        let ctx = json!({"body": {"links": {"next": "/items?page=2"}}});
        assert_eq!(
            eval("body.links.next", &ctx).unwrap(),
            ExpressionOutcome::Url("/items?page=2".to_string())
        );
    }

    #[test]
    fn test_null_and_missing_are_done() {
        let ctx = json!({"body": {"next": null}});
        assert_eq!(eval("body.next", &ctx).unwrap(), ExpressionOutcome::Done);
        assert_eq!(eval("body.missing", &ctx).unwrap(), ExpressionOutcome::Done);
        assert_eq!(
            eval("body.missing.deeper", &ctx).unwrap(),
            ExpressionOutcome::Done
        );
        assert_eq!(eval("''", &ctx).unwrap(), ExpressionOutcome::Done);
        assert_eq!(eval("false", &ctx).unwrap(), ExpressionOutcome::Done);
    }

    #[test]
    fn test_conditional_expression() {
        let source = "url ~ '&page=' ~ (page + 1) if status == 200 and body.items else none";

        let ctx = json!({"url": "https://api/x?a=1", "status": 200, "page": 1, "body": {"items": [1]}});
        assert_eq!(
            eval(source, &ctx).unwrap(),
            ExpressionOutcome::Url("https://api/x?a=1&page=2".to_string())
        );

        let ctx = json!({"url": "https://api/x?a=1", "status": 200, "page": 3, "body": {"items": []}});
        assert_eq!(eval(source, &ctx).unwrap(), ExpressionOutcome::Done);
    }

    #[test]
    fn test_request_map() {
        let ctx = json!({"page": 2, "body": {"cursor": "c2"}});
        let outcome = eval(
            r#"{"url": "https://api/search", "method": "post", "headers": {"X-Page": page + 1}, "body": {"cursor": body.cursor}}"#,
            &ctx,
        )
        .unwrap();

        let mut headers = BTreeMap::new();
        headers.insert("X-Page".to_string(), "3".to_string());
        assert_eq!(
            outcome,
            ExpressionOutcome::Request {
                url: "https://api/search".to_string(),
                method: Some(Method::POST),
                headers,
                body: Some(Some(r#"{"cursor":"c2"}"#.to_string())),
            }
        );
    }

    #[test]
    fn test_request_map_null_url_is_done() {
        let ctx = json!({"body": {"next": null}});
        assert_eq!(
            eval(r#"{"url": body.next}"#, &ctx).unwrap(),
            ExpressionOutcome::Done
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        let ctx = json!({});
        for source in ["42", "true", "[1, 2]", r#"{"next": "x"}"#, r#"{"url": 5}"#] {
            let err = eval(source, &ctx).unwrap_err();
            assert!(
                matches!(err, Error::ExpressionEvaluation { .. }),
                "{source} should fail, got {err:?}"
            );
        }
    }

    #[test]
    fn test_unsupported_method() {
        let err = eval(r#"{"url": "https://api/x", "method": "TRACE"}"#, &json!({})).unwrap_err();
        assert!(err.to_string().contains("TRACE"));
    }

    #[test]
    fn test_runtime_error() {
        let err = eval(r#""abc" + 1"#, &json!({})).unwrap_err();
        assert!(matches!(err, Error::ExpressionEvaluation { .. }));
    }
}
