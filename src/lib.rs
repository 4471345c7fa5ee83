//! Logsite - rate limiting state for log statements
//!
//! This crate decides, for each occurrence of a rate limited log statement,
//! whether it should be emitted or suppressed. State is tracked per call site
//! with lock-free atomics so that hot, contended logging paths never block.

pub mod config;
pub mod error;
pub mod ratelimit;

pub use error::{LogSiteError, Result};
pub use ratelimit::{LogSiteKey, LogSiteMap, LogSiteStats, RateLimitPeriod, RateLimitPolicy, TimeUnit};
