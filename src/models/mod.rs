//! Domain models for the aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod outcome;
mod source;

// Re-export all public types
pub use config::{CleaningConfig, Config, HttpConfig};
pub use listing::{Listing, RawRecord, dedup_key, listing_id};
pub use outcome::{
    AggregateResult, FailureReason, RunStats, SourceFailure, SourceResult, SourceStatus,
};
pub use source::{HtmlSelectors, SourceConfig, SourceKind};
