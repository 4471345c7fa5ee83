//! Rate limiting periods for "at most every" log statements.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{LogSiteError, Result};

/// Time granularity of a rate limiting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Number of nanoseconds in one unit.
    pub fn nanos_per_unit(&self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Convert `n` of this unit to nanoseconds, saturating instead of wrapping.
    pub fn to_nanos(&self, n: i64) -> i64 {
        n.saturating_mul(self.nanos_per_unit())
    }

    fn name(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rate limiting window of `n` units of time.
///
/// The `(n, unit)` pair is immutable and is the only thing considered by
/// equality and hashing. Alongside it the period carries a reporting side
/// channel: the number of log statements skipped before the most recent
/// emission, written by [`LogSiteStats::check_last_timestamp`] and shown by
/// the `Display` rendering.
///
/// A period shared by several call sites will report whichever site rolled
/// over last. Use [`LogSiteStats::try_advance`] to receive the skip count
/// directly when that matters.
///
/// [`LogSiteStats::check_last_timestamp`]: super::LogSiteStats::check_last_timestamp
/// [`LogSiteStats::try_advance`]: super::LogSiteStats::try_advance
#[derive(Debug)]
pub struct RateLimitPeriod {
    n: i64,
    unit: TimeUnit,
    /// -1 until the first successful rollover.
    skip_count: AtomicI64,
}

impl RateLimitPeriod {
    /// Create a period of `n` units. Fails if `n` is not positive.
    pub fn new(n: i64, unit: TimeUnit) -> Result<Self> {
        if n <= 0 {
            return Err(LogSiteError::InvalidPeriod(n));
        }
        Ok(Self {
            n,
            unit,
            skip_count: AtomicI64::new(-1),
        })
    }

    /// Length of the period in `unit`s.
    pub fn n(&self) -> i64 {
        self.n
    }

    /// Time unit of the period.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Length of the period in nanoseconds.
    ///
    /// Always strictly positive: nanoseconds are the finest unit, so the
    /// result is at least `n`, and the conversion saturates rather than wraps.
    pub fn to_nanos(&self) -> i64 {
        self.unit.to_nanos(self.n)
    }

    /// Skip count recorded at the most recent rollover, if any.
    pub fn skip_count(&self) -> Option<u32> {
        u32::try_from(self.skip_count.load(Ordering::Relaxed)).ok()
    }

    pub(crate) fn set_skip_count(&self, skipped: u32) {
        self.skip_count.store(i64::from(skipped), Ordering::Relaxed);
    }
}

impl Clone for RateLimitPeriod {
    fn clone(&self) -> Self {
        Self {
            n: self.n,
            unit: self.unit,
            skip_count: AtomicI64::new(self.skip_count.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for RateLimitPeriod {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.unit == other.unit
    }
}

impl Eq for RateLimitPeriod {}

impl Hash for RateLimitPeriod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.n.hash(state);
        self.unit.hash(state);
    }
}

impl fmt::Display for RateLimitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.n, self.unit)?;
        let skipped = self.skip_count.load(Ordering::Relaxed);
        if skipped > 0 {
            write!(f, " [skipped: {}]", skipped)?;
        }
        Ok(())
    }
}
