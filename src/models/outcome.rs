//! Per-source outcomes and the aggregate result of a run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::FetchError;
use crate::models::{Listing, RawRecord};

/// Why a source produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    HttpError(u16),
    ConnectionError,
    ParseError,
    NoResults,
}

impl FailureReason {
    /// Reason code, e.g. `timeout` or `http_error:404`.
    pub fn code(&self) -> String {
        match self {
            FailureReason::Timeout => "timeout".to_string(),
            FailureReason::HttpError(code) => format!("http_error:{code}"),
            FailureReason::ConnectionError => "connection_error".to_string(),
            FailureReason::ParseError => "parse_error".to_string(),
            FailureReason::NoResults => "no_results".to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for FailureReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

/// A failed source with its reason code and a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl From<FetchError> for SourceFailure {
    fn from(error: FetchError) -> Self {
        Self {
            reason: error.reason(),
            detail: error.to_string(),
        }
    }
}

/// Outcome of a single adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResult {
    Success(Vec<RawRecord>),
    Failure(SourceFailure),
}

impl SourceResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success(_))
    }
}

impl From<std::result::Result<Vec<RawRecord>, FetchError>> for SourceResult {
    fn from(result: std::result::Result<Vec<RawRecord>, FetchError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => {
                SourceResult::Failure(FetchError::Empty.into())
            }
            Ok(records) => SourceResult::Success(records),
            Err(e) => SourceResult::Failure(e.into()),
        }
    }
}

/// Status of one source after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok {
        raw: usize,
        accepted: usize,
        rejected: usize,
    },
    Failed {
        reason: FailureReason,
        detail: String,
    },
}

impl SourceStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SourceStatus::Failed { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            SourceStatus::Failed { reason, .. } => Some(*reason),
            SourceStatus::Ok { .. } => None,
        }
    }
}

impl From<SourceFailure> for SourceStatus {
    fn from(failure: SourceFailure) -> Self {
        SourceStatus::Failed {
            reason: failure.reason,
            detail: failure.detail,
        }
    }
}

/// Counters for a single aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub raw_total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates_removed: usize,
    pub failed_sources: usize,
}

impl RunStats {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            finished_at: at,
            raw_total: 0,
            accepted: 0,
            rejected: 0,
            duplicates_removed: 0,
            failed_sources: 0,
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Output of the aggregation pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// Deduplicated listings in first-occurrence order
    pub listings: Vec<Listing>,

    /// Status per source name
    pub statuses: BTreeMap<String, SourceStatus>,

    pub stats: RunStats,
}

impl AggregateResult {
    /// Names and reasons of sources that failed.
    pub fn failed_sources(&self) -> Vec<(&str, FailureReason)> {
        self.statuses
            .iter()
            .filter_map(|(name, status)| status.reason().map(|r| (name.as_str(), r)))
            .collect()
    }

    /// True when every source failed.
    pub fn is_total_failure(&self) -> bool {
        !self.statuses.is_empty() && self.statuses.values().all(SourceStatus::is_failed)
    }
}
