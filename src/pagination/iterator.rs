//! Pagination iterator and factory
//!
//! [`PaginationIteratorFactory::create`] turns a [`SourceConfig`] into a
//! [`PaginationIterator`] bound to a transport. The iterator issues exactly
//! one request per `next()` call and hands back the raw page.

use super::custom::PaginationExpression;
use super::strategies::{
    CustomPaginator, IndexIncrementPaginator, LinkInBodyPaginator, LinkInHeaderPaginator,
    NonePaginator, PaginationStrategy, Paginator, TokenInBodyPaginator,
};
use super::types::{check_path, inject_param, NextPage, Page, PaginationState};
use crate::config::{HttpErrorAction, PaginationConfig, PaginationType, ParamLocation, SourceConfig};
use crate::error::{Error, Result};
use crate::http::{
    HttpErrorPolicy, RequestDescriptor, ReqwestTransport, Transport, TransportConfig,
};
use crate::template::{self, TemplateContext};
use crate::types::JsonValue;
use futures::Stream;
use reqwest::header::HeaderName;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const INDEX_PLACEHOLDER: &str = "pagination.index";

// ============================================================================
// Iterator
// ============================================================================

/// Stateful, single-pass iterator over the pages of one scan
///
/// Not meant to be shared: one iterator belongs to one worker. A fresh scan
/// needs a fresh iterator from the factory.
pub struct PaginationIterator<T: Transport> {
    config: Arc<SourceConfig>,
    transport: T,
    strategy: PaginationStrategy,
    policy: HttpErrorPolicy,
    state: PaginationState,
}

impl<T: Transport> PaginationIterator<T> {
    /// Whether a request is queued; never touches the network
    pub fn has_next(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Number of pages returned so far
    pub fn page_count(&self) -> u64 {
        self.state.pages()
    }

    /// The pagination type of this iterator
    pub fn pagination_type(&self) -> PaginationType {
        self.strategy.pagination_type()
    }

    /// The config this iterator is bound to
    pub fn config(&self) -> &Arc<SourceConfig> {
        &self.config
    }

    /// Current pagination state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// The request the next call to [`next`](Self::next) will issue
    pub fn peek_request(&self) -> Option<&RequestDescriptor> {
        self.state.next_request()
    }

    /// Fetch the next page
    ///
    /// Errors leave the state untouched, so the same request is issued
    /// again if the caller retries.
    pub async fn next(&mut self) -> Result<Page> {
        let Some(request) = self.state.next_request().cloned() else {
            return Err(Error::TerminatedIteration {
                pages: self.state.pages(),
            });
        };

        let wait = self.config.wait_between_pages_ms;
        if wait > 0 && self.state.pages() > 0 {
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }

        let number = self.state.pages() + 1;
        debug!("Fetching page {}: {} {}", number, request.method, request.url);

        let response = self.transport.execute(&request).await?;

        let next = match self.policy.action(response.status) {
            HttpErrorAction::Success => {
                self.strategy
                    .process_response(&request, &response, number)?
            }
            HttpErrorAction::Stop => {
                warn!(
                    "Page {} returned HTTP {}, stopping pagination",
                    number, response.status
                );
                NextPage::Done
            }
            HttpErrorAction::Fail => {
                return Err(Error::http_status(response.status, response.text()));
            }
        };

        if next.is_done() {
            debug!(
                "{} pagination finished after {} page(s)",
                self.strategy.pagination_type(),
                number
            );
        }

        self.state.advance(&request, response.status, next);
        Ok(Page::new(number, request.url, response))
    }

    /// Turn the iterator into a lazy stream of pages
    ///
    /// The stream ends after the last page, or right after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> {
        futures::stream::unfold(Some(self), |iterator| async move {
            let mut iterator = iterator?;
            if !iterator.has_next() {
                return None;
            }
            match iterator.next().await {
                Ok(page) => Some((Ok(page), Some(iterator))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl<T: Transport> std::fmt::Debug for PaginationIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationIterator")
            .field("pagination_type", &self.pagination_type())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds the iterator matching a config's pagination type
pub struct PaginationIteratorFactory;

impl PaginationIteratorFactory {
    /// Create an iterator bound to `config` and `transport`
    ///
    /// Fails with `InvalidConfiguration` before any network activity if the
    /// config cannot drive a scan.
    pub fn create<T: Transport>(
        config: Arc<SourceConfig>,
        transport: T,
    ) -> Result<PaginationIterator<T>> {
        config.validate()?;

        let policy = HttpErrorPolicy::from_rules(&config.http_errors)?;
        let base = build_base_request(&config)?;
        let strategy = build_strategy(&config, &base)?;
        let first = strategy
            .first_request(&base)
            .map_err(|e| Error::invalid_config(format!("cannot build first request: {e}")))?;

        debug!("Created {} iterator for {}", strategy.pagination_type(), first.url);

        Ok(PaginationIterator {
            config,
            transport,
            strategy,
            policy,
            state: PaginationState::new(first),
        })
    }

    /// Create an iterator over a reqwest transport configured from `config`
    pub fn create_with_reqwest(
        config: Arc<SourceConfig>,
    ) -> Result<PaginationIterator<ReqwestTransport>> {
        let transport = ReqwestTransport::with_config(TransportConfig::from_source(&config))?;
        Self::create(config, transport)
    }
}

fn vars_value(config: &SourceConfig) -> JsonValue {
    JsonValue::Object(
        config
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}

/// Render `{{ vars.* }}`; only the URL of an index-in-URL source may keep
/// the `{{ pagination.index }}` placeholder
fn render_vars(text: &str, ctx: &TemplateContext, allow_index: bool) -> Result<String> {
    let rendered = template::render_optional(text, ctx);
    for variable in template::extract_variables(&rendered) {
        if !(allow_index && variable == INDEX_PLACEHOLDER) {
            return Err(Error::undefined_var(variable));
        }
    }
    Ok(rendered)
}

fn index_in_url(config: &SourceConfig) -> bool {
    matches!(
        config.pagination,
        PaginationConfig::IncrementAnIndex {
            location: ParamLocation::Url,
            ..
        }
    )
}

fn build_base_request(config: &SourceConfig) -> Result<RequestDescriptor> {
    let ctx = TemplateContext::with_vars(vars_value(config));
    let index_in_url = index_in_url(config);

    let url = render_vars(config.url.trim(), &ctx, index_in_url)
        .map_err(|e| Error::invalid_config(format!("url: {e}")))?;
    if index_in_url {
        if !template::extract_variables(&url).iter().any(|v| v == INDEX_PLACEHOLDER) {
            return Err(Error::invalid_config(
                "pagination location 'url' needs a {{ pagination.index }} placeholder in the url",
            ));
        }
    } else {
        url::Url::parse(&url)
            .map_err(|e| Error::invalid_config(format!("invalid url '{url}': {e}")))?;
    }

    let mut request = RequestDescriptor::new(config.method, url);
    for (name, value) in &config.headers {
        let value = render_vars(value, &ctx, false)
            .map_err(|e| Error::invalid_config(format!("header '{name}': {e}")))?;
        request.set_header(name.clone(), value);
    }
    if let Some(body) = &config.body {
        let body = render_vars(body, &ctx, false)
            .map_err(|e| Error::invalid_config(format!("body: {e}")))?;
        request.body = Some(body);
    }

    Ok(request)
}

fn check_header_name(name: &str) -> Result<()> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map(drop)
        .map_err(|_| Error::invalid_config(format!("'{name}' is not a valid header name")))
}

fn build_strategy(config: &SourceConfig, base: &RequestDescriptor) -> Result<PaginationStrategy> {
    if let Some(path) = &config.results_path {
        check_path(path)?;
    }

    let strategy = match &config.pagination {
        PaginationConfig::None => PaginationStrategy::None(NonePaginator),
        PaginationConfig::LinkInResponseHeader { header, rel } => {
            check_header_name(header)?;
            PaginationStrategy::LinkInHeader(
                LinkInHeaderPaginator::new(header.trim()).with_rel(rel.trim()),
            )
        }
        PaginationConfig::LinkInResponseBody { next_page_path } => {
            check_path(next_page_path.trim())?;
            PaginationStrategy::LinkInBody(LinkInBodyPaginator::new(next_page_path.trim()))
        }
        PaginationConfig::TokenInResponseBody {
            token_path,
            param,
            location,
        } => {
            check_path(token_path.trim())?;
            if *location == ParamLocation::Header {
                check_header_name(param)?;
            }
            // Fail now rather than on page two if the token cannot be placed
            inject_param(base, *location, param, "")?;
            PaginationStrategy::TokenInBody(TokenInBodyPaginator::new(
                base.clone(),
                token_path.trim(),
                param.trim(),
                *location,
            ))
        }
        PaginationConfig::IncrementAnIndex {
            param,
            location,
            start,
            step,
            max,
            stop_on_empty_page,
        } => {
            if *location == ParamLocation::Header {
                check_header_name(param)?;
            }
            PaginationStrategy::IndexIncrement(
                IndexIncrementPaginator::new(base.clone(), param.trim(), *location, *start, *step)
                    .with_max(*max)
                    .with_empty_page_stop(*stop_on_empty_page, config.results_path.clone()),
            )
        }
        PaginationConfig::Custom { expression } => {
            let expression = PaginationExpression::compile(expression.trim())?;
            PaginationStrategy::Custom(CustomPaginator::new(expression, vars_value(config)))
        }
    };

    Ok(strategy)
}
