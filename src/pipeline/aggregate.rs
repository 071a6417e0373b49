//! Fan-out/fan-in aggregation over source adapters.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, FetchError, Result};
use crate::models::{AggregateResult, Config, RunStats, SourceResult, SourceStatus};
use crate::services::{Deduplicator, Normalized, Normalizer, SourceAdapter, build_adapters};
use crate::utils::http::{HttpTransport, Transport};

/// Runs every adapter concurrently, each under its own timeout, then
/// normalizes and deduplicates what came back.
#[derive(Debug, Clone)]
pub struct AggregationPipeline {
    normalizer: Normalizer,
    per_source_timeout: Duration,
    max_concurrent: usize,
}

impl AggregationPipeline {
    pub fn new(normalizer: Normalizer, per_source_timeout: Duration) -> Self {
        Self {
            normalizer,
            per_source_timeout,
            max_concurrent: usize::MAX,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Normalizer::from_config(config), config.per_source_timeout())
            .with_max_concurrent(config.http.max_concurrent)
    }

    /// Bound the number of sources fetched at once.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Aggregate listings from `adapters`.
    ///
    /// Fails only when `adapters` is empty or two adapters share a name.
    /// Individual source failures are reported in the status map.
    pub async fn run(&self, adapters: &[Arc<dyn SourceAdapter>]) -> Result<AggregateResult> {
        if adapters.is_empty() {
            return Err(AppError::NoSources);
        }
        let mut names = HashSet::new();
        if let Some(dup) = adapters.iter().map(|a| a.name()).find(|n| !names.insert(*n)) {
            return Err(AppError::config(format!("duplicate source name '{dup}'")));
        }

        let started_at = Utc::now();
        let concurrency = self.max_concurrent.min(adapters.len());

        // `buffered` yields in registration order.
        let results: Vec<SourceResult> = stream::iter(adapters.iter())
            .map(|adapter| self.fetch_with_timeout(adapter.as_ref()))
            .buffered(concurrency)
            .collect()
            .await;

        let mut stats = RunStats::started(started_at);
        let mut statuses = BTreeMap::new();
        let mut accepted = Vec::new();

        for (adapter, result) in adapters.iter().zip(results) {
            let name = adapter.name();
            let status = match result {
                SourceResult::Success(records) => {
                    let raw = records.len();
                    let mut rejected = 0usize;
                    for record in records {
                        match self.normalizer.normalize(record, name, adapter.base_url()) {
                            Normalized::Accepted(listing) => accepted.push(listing),
                            Normalized::Rejected(reason) => {
                                rejected += 1;
                                log::trace!("{name}: rejected record ({reason:?})");
                            }
                        }
                    }
                    log::debug!("{name}: {raw} raw, {} accepted, {rejected} rejected", raw - rejected);
                    stats.raw_total += raw;
                    stats.rejected += rejected;
                    SourceStatus::Ok {
                        raw,
                        accepted: raw - rejected,
                        rejected,
                    }
                }
                SourceResult::Failure(failure) => {
                    log::warn!("Source {name} unavailable: {} ({})", failure.reason, failure.detail);
                    stats.failed_sources += 1;
                    failure.into()
                }
            };
            statuses.insert(name.to_string(), status);
        }

        stats.accepted = accepted.len();
        let deduplicator = Deduplicator::new(adapters.iter().map(|a| a.name().to_string()));
        let listings = deduplicator.dedupe(accepted);
        stats.duplicates_removed = stats.accepted - listings.len();
        stats.finished_at = Utc::now();

        log::info!(
            "Aggregated {} listings from {}/{} sources ({} rejected, {} duplicates) in {} ms",
            listings.len(),
            adapters.len() - stats.failed_sources,
            adapters.len(),
            stats.rejected,
            stats.duplicates_removed,
            stats.elapsed_ms()
        );

        Ok(AggregateResult {
            listings,
            statuses,
            stats,
        })
    }

    async fn fetch_with_timeout(&self, adapter: &dyn SourceAdapter) -> SourceResult {
        let budget = adapter.timeout().unwrap_or(self.per_source_timeout);
        match tokio::time::timeout(budget, adapter.fetch()).await {
            Ok(result) => result,
            Err(_) => SourceResult::Failure(FetchError::Timeout.into()),
        }
    }
}

/// Build a fresh transport and adapters from `config`, then run once.
pub async fn run_aggregation(config: &Config) -> Result<AggregateResult> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http)?);
    let adapters = build_adapters(config, transport)?;
    AggregationPipeline::from_config(config).run(&adapters).await
}
