//! Job listing aggregator library.
//!
//! Fetches job boards and feeds concurrently, keeps postings that mention
//! the target keyword, and merges duplicates across sources.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
