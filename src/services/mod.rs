//! Service layer for the aggregator.
//!
//! This module contains the business logic for:
//! - Source adapters (`HtmlAdapter`, `FeedAdapter`) behind `SourceAdapter`
//! - Listing normalization (`Normalizer`)
//! - Cross-source deduplication (`Deduplicator`)

mod dedup;
mod feed;
mod html;
mod normalizer;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::models::{Config, RawRecord, SourceConfig, SourceKind, SourceResult};
use crate::utils::http::Transport;

pub use dedup::Deduplicator;
pub use feed::FeedAdapter;
pub use html::HtmlAdapter;
pub use normalizer::{Normalized, Normalizer, RejectReason};

/// A pluggable job source.
///
/// `fetch` never fails: every transport or parse problem is reported as
/// a [`SourceResult::Failure`].
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique source identifier.
    fn name(&self) -> &str;

    /// Base URL used to resolve relative links.
    fn base_url(&self) -> &Url;

    /// Per-source time budget, overriding the pipeline default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn fetch(&self) -> SourceResult;
}

/// Settings every adapter shares.
#[derive(Clone)]
pub struct SourceTarget {
    pub name: String,
    pub url: Url,
    pub timeout: Option<Duration>,
    pub max_records: usize,
    pub transport: Arc<dyn Transport>,
}

impl SourceTarget {
    pub fn new(name: impl Into<String>, url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            url,
            timeout: None,
            max_records: 200,
            transport,
        }
    }

    pub fn from_config(
        source: &SourceConfig,
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            url: source.parsed_url()?,
            timeout: source.timeout_secs.map(Duration::from_secs),
            max_records: config.http.max_records_per_source,
            transport,
        })
    }

    /// Budget for the HTTP request itself.
    fn request_timeout(&self, fallback: Duration) -> Duration {
        self.timeout.unwrap_or(fallback)
    }
}

/// Build adapters for every active source, in registration order.
pub fn build_adapters(
    config: &Config,
    transport: Arc<dyn Transport>,
) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let terms = config.keyword_terms();
    let request_timeout = config.per_source_timeout();

    config
        .active_sources()
        .into_iter()
        .map(|source| -> Result<Arc<dyn SourceAdapter>> {
            let target = SourceTarget::from_config(source, config, Arc::clone(&transport))?;
            let adapter: Arc<dyn SourceAdapter> = match source.kind {
                SourceKind::Html => Arc::new(HtmlAdapter::new(
                    target,
                    source.selectors.clone(),
                    terms.clone(),
                    request_timeout,
                )?),
                SourceKind::Feed => Arc::new(FeedAdapter::new(target, request_timeout)),
            };
            Ok(adapter)
        })
        .collect()
}

/// Drop repeated (link, title) pairs, preserving order, and cap the count.
pub(crate) fn finish_records(records: Vec<RawRecord>, max: usize) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.link.clone(), r.title.clone())))
        .take(max)
        .collect()
}
