//! Registry mapping log sites to their statistics.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::key::LogSiteKey;
use super::stats::LogSiteStats;

/// Concurrent map from a log site key to its unique [`LogSiteStats`].
///
/// Records are created lazily and never removed; the number of entries is
/// bounded by the number of log statements in the program. Lookups and
/// insertions only touch the shard owning the key, so unrelated sites never
/// contend with each other.
///
/// Applications normally use the process-wide instance returned by
/// [`LogSiteMap::global`]. Tests construct their own.
#[derive(Debug)]
pub struct LogSiteMap<K: Eq + Hash = LogSiteKey> {
    sites: DashMap<K, Arc<LogSiteStats>>,
}

impl<K: Eq + Hash + Debug> LogSiteMap<K> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            sites: DashMap::new(),
        }
    }

    /// Return the statistics for `key`, creating them on first use.
    ///
    /// Every caller asking for the same key gets the same record, even when
    /// several threads race to create it. A racing loser's freshly built
    /// record is simply dropped.
    pub fn get_or_create(&self, key: K) -> Arc<LogSiteStats> {
        if let Some(stats) = self.sites.get(&key) {
            return Arc::clone(stats.value());
        }

        let stats = Arc::new(LogSiteStats::new());
        match self.sites.entry(key) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(vacant) => {
                debug!(key = ?vacant.key(), "Creating new log site stats");
                Arc::clone(vacant.insert(stats).value())
            }
        }
    }

    /// Return the statistics for `key` if the site has been seen.
    pub fn get(&self, key: &K) -> Option<Arc<LogSiteStats>> {
        self.sites.get(key).map(|stats| Arc::clone(stats.value()))
    }

    /// Number of tracked log sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether no log site has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl LogSiteMap<LogSiteKey> {
    /// The process-wide map, initialized on first access and never torn down.
    pub fn global() -> &'static LogSiteMap<LogSiteKey> {
        static GLOBAL: OnceLock<LogSiteMap<LogSiteKey>> = OnceLock::new();
        GLOBAL.get_or_init(LogSiteMap::new)
    }
}

impl<K: Eq + Hash + Debug> Default for LogSiteMap<K> {
    fn default() -> Self {
        Self::new()
    }
}
