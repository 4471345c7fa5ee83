//! Rate limiting logic and per log site state.

mod key;
mod period;
mod policy;
mod registry;
mod stats;

pub use key::LogSiteKey;
pub use period::{RateLimitPeriod, TimeUnit};
pub use policy::RateLimitPolicy;
pub use registry::LogSiteMap;
pub use stats::LogSiteStats;
