//! Pipeline entry points.
//!
//! - `AggregationPipeline::run`: aggregate listings from a set of adapters
//! - `run_aggregation`: build everything from configuration and run once

pub mod aggregate;

pub use aggregate::{AggregationPipeline, run_aggregation};
