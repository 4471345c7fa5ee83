//! Per call site statistics used to decide when rate limited log statements fire.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

use super::period::RateLimitPeriod;

/// Mutable statistics for exactly one log site.
///
/// All updates go through atomic read-modify-write operations, so a single
/// instance can be shared between any number of threads without locking.
#[derive(Debug, Default)]
pub struct LogSiteStats {
    /// Total number of count based checks performed
    invocation_count: AtomicU64,
    /// Timestamp of the last emission allowed by a period check, 0 if none yet
    last_timestamp_nanos: AtomicI64,
    /// Period checks suppressed since the last allowed one
    skipped_log_statements: AtomicU32,
}

impl LogSiteStats {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the invocation count and return true if the value it held
    /// before the increment was a multiple of `rate_limit_count`.
    ///
    /// The 1st, (1+N)th, (1+2N)th ... calls are allowed. `rate_limit_count`
    /// must be at least 1.
    pub fn increment_and_check_invocation_count(&self, rate_limit_count: u32) -> bool {
        debug_assert!(rate_limit_count > 0, "rate limit count must be positive");
        let previous = self.invocation_count.fetch_add(1, Ordering::SeqCst);
        previous % u64::from(rate_limit_count) == 0
    }

    /// Return true if `timestamp_nanos` is at or past the end of the current
    /// rate limiting period, advancing the period start to it.
    ///
    /// On success the number of statements skipped since the previous
    /// emission is recorded on `period` for display. On failure the skip count
    /// is incremented.
    pub fn check_last_timestamp(&self, timestamp_nanos: i64, period: &RateLimitPeriod) -> bool {
        match self.try_advance(timestamp_nanos, period) {
            Some(skipped) => {
                period.set_skip_count(skipped);
                true
            }
            None => false,
        }
    }

    /// Same decision as [`check_last_timestamp`](Self::check_last_timestamp),
    /// but returns the drained skip count instead of storing it on `period`.
    ///
    /// Returns `Some(skipped)` when the caller should log.
    pub fn try_advance(&self, timestamp_nanos: i64, period: &RateLimitPeriod) -> Option<u32> {
        let last_nanos = self.last_timestamp_nanos.load(Ordering::SeqCst);
        // A deadline past i64::MAX (or below zero) is never reached.
        let due = match last_nanos.checked_add(period.to_nanos()) {
            Some(deadline_nanos) if deadline_nanos >= 0 => {
                timestamp_nanos >= deadline_nanos || last_nanos == 0
            }
            _ => false,
        };
        // The period is never zero, so threads that read the same last_nanos
        // race on a single transition and only one exchange can win.
        if due
            && self
                .last_timestamp_nanos
                .compare_exchange(last_nanos, timestamp_nanos, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            Some(self.skipped_log_statements.swap(0, Ordering::SeqCst))
        } else {
            self.skipped_log_statements.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    /// Number of count based checks performed so far.
    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::SeqCst)
    }

    /// Timestamp of the last emission allowed by a period check (0 if none).
    pub fn last_timestamp_nanos(&self) -> i64 {
        self.last_timestamp_nanos.load(Ordering::SeqCst)
    }

    /// Period checks suppressed since the last allowed one.
    pub fn skipped_log_statements(&self) -> u32 {
        self.skipped_log_statements.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::TimeUnit;
    use std::sync::Barrier;
    use std::thread;

    const SECOND: i64 = 1_000_000_000;

    fn seconds(n: i64) -> RateLimitPeriod {
        RateLimitPeriod::new(n, TimeUnit::Seconds).unwrap()
    }

    #[test]
    fn test_count_check_allows_first_of_each_block() {
        for n in 1..=7u32 {
            let stats = LogSiteStats::new();
            let results: Vec<bool> = (0..n)
                .map(|_| stats.increment_and_check_invocation_count(n))
                .collect();

            assert!(results[0], "first call must log for n = {}", n);
            assert_eq!(results.iter().filter(|r| **r).count(), 1);
        }
    }

    #[test]
    fn test_count_check_fires_on_multiples() {
        let n = 5u32;
        let stats = LogSiteStats::new();

        for index in 0..(3 * n + 2) {
            let logged = stats.increment_and_check_invocation_count(n);
            assert_eq!(logged, index % n == 0, "call index {}", index);
        }
        assert_eq!(stats.invocation_count(), u64::from(3 * n + 2));
    }

    #[test]
    fn test_count_of_one_always_logs() {
        let stats = LogSiteStats::new();
        assert!((0..10).all(|_| stats.increment_and_check_invocation_count(1)));
    }

    #[test]
    fn test_first_timestamp_check_always_logs() {
        let period = seconds(1);

        let stats = LogSiteStats::new();
        assert!(stats.check_last_timestamp(42, &period));
        assert_eq!(stats.last_timestamp_nanos(), 42);

        // Even a timestamp earlier than the period length is accepted the first time.
        let stats = LogSiteStats::new();
        assert!(stats.check_last_timestamp(1, &seconds(3600)));
    }

    #[test]
    fn test_timestamp_check_respects_deadline() {
        let period = seconds(2);
        let stats = LogSiteStats::new();
        let t0 = 10 * SECOND;

        assert!(stats.check_last_timestamp(t0, &period));
        assert!(!stats.check_last_timestamp(t0 + 2 * SECOND - 1, &period));
        assert!(stats.check_last_timestamp(t0 + 2 * SECOND, &period));
        assert_eq!(stats.last_timestamp_nanos(), t0 + 2 * SECOND);
    }

    #[test]
    fn test_skip_count_reported_and_reset() {
        let period = seconds(1);
        let stats = LogSiteStats::new();
        let t0 = SECOND;

        assert!(stats.check_last_timestamp(t0, &period));
        assert_eq!(period.skip_count(), Some(0));
        assert_eq!(period.to_string(), "1 SECONDS");

        for offset in 1..=4 {
            assert!(!stats.check_last_timestamp(t0 + offset, &period));
        }
        assert_eq!(stats.skipped_log_statements(), 4);

        assert!(stats.check_last_timestamp(t0 + SECOND, &period));
        assert_eq!(period.skip_count(), Some(4));
        assert_eq!(period.to_string(), "1 SECONDS [skipped: 4]");
        assert_eq!(stats.skipped_log_statements(), 0);

        assert!(stats.check_last_timestamp(t0 + 2 * SECOND, &period));
        assert_eq!(period.skip_count(), Some(0));
    }

    #[test]
    fn test_try_advance_returns_skips_without_touching_period() {
        let period = seconds(1);
        let stats = LogSiteStats::new();

        assert_eq!(stats.try_advance(SECOND, &period), Some(0));
        assert_eq!(stats.try_advance(SECOND + 1, &period), None);
        assert_eq!(stats.try_advance(SECOND + 2, &period), None);
        assert_eq!(stats.try_advance(2 * SECOND, &period), Some(2));
        assert_eq!(period.skip_count(), None);
    }

    #[test]
    fn test_overflowing_deadline_never_logs() {
        let period = RateLimitPeriod::new(i64::MAX, TimeUnit::Nanoseconds).unwrap();
        let stats = LogSiteStats::new();

        assert!(stats.check_last_timestamp(1, &period));
        assert!(!stats.check_last_timestamp(i64::MAX, &period));

        let huge = RateLimitPeriod::new(i64::from(i32::MAX), TimeUnit::Days).unwrap();
        let stats = LogSiteStats::new();
        assert!(stats.check_last_timestamp(SECOND, &huge));
        for t in [2 * SECOND, i64::MAX / 2, i64::MAX] {
            assert!(!stats.check_last_timestamp(t, &huge));
        }
        assert_eq!(stats.skipped_log_statements(), 3);
    }

    #[test]
    fn test_checks_are_independent() {
        let period = seconds(1);
        let stats = LogSiteStats::new();

        assert!(stats.increment_and_check_invocation_count(3));
        assert!(stats.check_last_timestamp(SECOND, &period));
        assert!(!stats.increment_and_check_invocation_count(3));
        assert!(!stats.check_last_timestamp(SECOND + 1, &period));

        assert_eq!(stats.invocation_count(), 2);
        assert_eq!(stats.skipped_log_statements(), 1);
    }

    #[test]
    fn test_concurrent_count_checks_see_distinct_values() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 1_000;
        let rate = 10u32;
        let stats = LogSiteStats::new();
        let barrier = Barrier::new(THREADS);

        let logged: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        (0..PER_THREAD)
                            .filter(|_| stats.increment_and_check_invocation_count(rate))
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        let total = THREADS * PER_THREAD;
        assert_eq!(stats.invocation_count(), total as u64);
        assert_eq!(logged, total / rate as usize);
    }

    #[test]
    fn test_concurrent_timestamp_checks_have_one_winner() {
        const THREADS: usize = 32;
        let period = seconds(1);
        let stats = LogSiteStats::new();
        let t0 = SECOND;
        assert!(stats.check_last_timestamp(t0, &period));

        let barrier = Barrier::new(THREADS);
        let winners: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        stats.check_last_timestamp(t0 + SECOND, &period) as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(stats.last_timestamp_nanos(), t0 + SECOND);
        assert_eq!(stats.skipped_log_statements(), (THREADS - 1) as u32);
    }
}
