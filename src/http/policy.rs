//! Status code policy
//!
//! Decides, per response status, whether a page is a normal page, a failure,
//! or the last page. Rules are regexes over the decimal status code and the
//! first matching rule wins.

use crate::config::{HttpErrorAction, HttpErrorRule};
use crate::error::{Error, Result};
use regex::Regex;

/// Compiled status handling rules
#[derive(Debug, Clone, Default)]
pub struct HttpErrorPolicy {
    rules: Vec<(Regex, HttpErrorAction)>,
}

impl HttpErrorPolicy {
    /// Compile rules; invalid regexes are configuration errors
    pub fn from_rules(rules: &[HttpErrorRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = format!("^(?:{})$", rule.status.trim());
                Regex::new(&pattern)
                    .map(|re| (re, rule.action))
                    .map_err(|e| {
                        Error::invalid_config(format!(
                            "invalid http_errors status pattern '{}': {e}",
                            rule.status
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Action for a status code
    pub fn action(&self, status: u16) -> HttpErrorAction {
        let code = status.to_string();
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(&code))
            .map_or_else(|| default_action(status), |(_, action)| *action)
    }

    /// Number of configured rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn default_action(status: u16) -> HttpErrorAction {
    if (200..300).contains(&status) {
        HttpErrorAction::Success
    } else {
        HttpErrorAction::Fail
    }
}
