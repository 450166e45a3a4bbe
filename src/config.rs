//! Serializable configuration for the engine and the resilience primitives.
//!
//! Every field has a default, so partial documents deserialize cleanly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name attached to the engine's tracing span.
    pub name: String,

    /// Re-raise reduction failures instead of only reporting them.
    /// Defaults to on in debug builds.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "engine".to_string(),
            strict: cfg!(debug_assertions),
        }
    }
}

/// `TimedCache` settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched value stays fresh, in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub const SHORT_LIFETIME_SECS: u64 = 240;
    pub const LONG_LIFETIME_SECS: u64 = 3600;

    /// TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::SHORT_LIFETIME_SECS,
        }
    }
}

/// `CancellablePoller` settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Wait between two fetches, in seconds.
    pub interval_secs: u64,

    /// Total number of fetches before giving up.
    pub max_retries: u32,
}

impl PollConfig {
    /// Interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_retries: 20,
        }
    }
}
