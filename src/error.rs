//! Unified error handling for the aggregator.
//!
//! Two layers:
//! - [`AppError`]: configuration and setup failures that abort a command.
//! - [`FetchError`]: transport and parse failures inside a single source
//!   adapter. These never leave the adapter; they are folded into a
//!   [`SourceFailure`](crate::models::SourceFailure).

use std::fmt;

use thiserror::Error;

use crate::models::FailureReason;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Nothing to aggregate
    #[error("No sources configured or enabled")]
    NoSources,
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failure while fetching or extracting a single source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request or the whole adapter call ran out of time
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection refused, DNS failure, broken body stream
    #[error("connection failed: {0}")]
    Connection(String),

    /// Page or feed did not have the expected structure
    #[error("unexpected content: {0}")]
    Parse(String),

    /// Source was reachable but yielded no usable records
    #[error("no usable records")]
    Empty,
}

impl FetchError {
    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Reason code reported to the display layer.
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::Timeout => FailureReason::Timeout,
            FetchError::Status(code) => FailureReason::HttpError(*code),
            FetchError::Connection(_) => FailureReason::ConnectionError,
            FetchError::Parse(_) => FailureReason::ParseError,
            FetchError::Empty => FailureReason::NoResults,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::parse(e)
        } else {
            FetchError::Connection(e.to_string())
        }
    }
}
