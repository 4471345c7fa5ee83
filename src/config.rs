//! Configuration of log site rate limits.
//!
//! Rate limits can be loaded from YAML so that noisy log statements can be
//! tuned without recompiling:
//!
//! ```yaml
//! default:
//!   every: 100
//! sites:
//!   connection_retry:
//!     at_most_every:
//!       n: 30
//!       unit: seconds
//!   cache_miss:
//!     every: 10
//!     at_most_every:
//!       n: 500
//!       unit: milliseconds
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::Path;
use tracing::info;

use crate::error::{LogSiteError, Result};
use crate::ratelimit::{RateLimitPeriod, RateLimitPolicy, TimeUnit};

/// Rate limit configuration for a set of named log sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Policy applied to sites without an entry of their own
    #[serde(default)]
    pub default: Option<PolicyConfig>,

    /// Per site policies, keyed by site name
    #[serde(default)]
    pub sites: HashMap<String, PolicyConfig>,
}

/// Rate limits for a single log site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Log the first of every N invocations
    #[serde(default)]
    pub every: Option<i64>,

    /// Log at most once per period
    #[serde(default)]
    pub at_most_every: Option<PeriodConfig>,
}

/// A rate limiting period as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    /// Number of time units
    pub n: i64,
    /// The time unit
    pub unit: TimeUnit,
}

impl PolicyConfig {
    /// Validate this entry and build the policy it describes.
    pub fn build(&self) -> Result<RateLimitPolicy> {
        let mut policy = RateLimitPolicy::unlimited();

        if let Some(every) = self.every {
            let n = u32::try_from(every)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or(LogSiteError::InvalidCount(every))?;
            policy = policy.with_every(n);
        }

        if let Some(period) = self.at_most_every {
            policy = policy.with_at_most_every(RateLimitPeriod::new(period.n, period.unit)?);
        }

        Ok(policy)
    }
}

impl RateLimitConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading log site rate limit configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| LogSiteError::Config(format!("Failed to parse rate limit config: {}", e)))
    }

    /// Build the policy for the named site, falling back to the default.
    ///
    /// Returns `Ok(None)` when neither the site nor a default is configured.
    pub fn policy_for(&self, site: &str) -> Result<Option<RateLimitPolicy>> {
        self.sites
            .get(site)
            .or(self.default.as_ref())
            .map(PolicyConfig::build)
            .transpose()
    }
}
