//! Rate limit policies combining count and period based checks.

use std::num::NonZeroU32;

use tracing::trace;

use super::period::RateLimitPeriod;
use super::stats::LogSiteStats;

/// The rate limits attached to a single log statement.
///
/// A policy can log every Nth invocation, at most once per period, both, or
/// neither. When both are set an invocation must pass the count check before
/// the period check is consulted, so invocations dropped by the count never
/// show up in the period's skip count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitPolicy {
    every: Option<NonZeroU32>,
    at_most_every: Option<RateLimitPeriod>,
}

impl RateLimitPolicy {
    /// A policy that never suppresses anything.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Log the first of every `n` invocations.
    pub fn every(n: NonZeroU32) -> Self {
        Self::default().with_every(n)
    }

    /// Log at most once per `period`.
    pub fn at_most_every(period: RateLimitPeriod) -> Self {
        Self::default().with_at_most_every(period)
    }

    /// Add a count based limit.
    pub fn with_every(mut self, n: NonZeroU32) -> Self {
        self.every = Some(n);
        self
    }

    /// Add a period based limit.
    pub fn with_at_most_every(mut self, period: RateLimitPeriod) -> Self {
        self.at_most_every = Some(period);
        self
    }

    /// The count based limit, if any.
    pub fn every_count(&self) -> Option<NonZeroU32> {
        self.every
    }

    /// The period based limit, if any. After a successful check its
    /// `Display` includes the number of skipped statements.
    pub fn period(&self) -> Option<&RateLimitPeriod> {
        self.at_most_every.as_ref()
    }

    /// Whether this policy allows every invocation.
    pub fn is_unlimited(&self) -> bool {
        self.every.is_none() && self.at_most_every.is_none()
    }

    /// Decide whether the invocation at `timestamp_nanos` should be logged,
    /// updating `stats` accordingly.
    pub fn should_log(&self, stats: &LogSiteStats, timestamp_nanos: i64) -> bool {
        if let Some(n) = self.every {
            if !stats.increment_and_check_invocation_count(n.get()) {
                trace!(every = n.get(), "Log statement suppressed by invocation count");
                return false;
            }
        }

        if let Some(ref period) = self.at_most_every {
            if !stats.check_last_timestamp(timestamp_nanos, period) {
                trace!(period = %period, timestamp_nanos, "Log statement suppressed by period");
                return false;
            }
        }

        true
    }
}
