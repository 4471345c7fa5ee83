//! Error types for log site rate limiting.

use thiserror::Error;

/// Main error type for logsite operations.
#[derive(Error, Debug)]
pub enum LogSiteError {
    /// A rate limiting period was constructed with a non-positive length
    #[error("time period must be positive: {0}")]
    InvalidPeriod(i64),

    /// A count based rate limit was configured with a non-positive count
    #[error("invocation count must be positive: {0}")]
    InvalidCount(i64),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for logsite operations.
pub type Result<T> = std::result::Result<T, LogSiteError>;
