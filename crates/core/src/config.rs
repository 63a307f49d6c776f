//! Search engine configuration.
//!
//! Mirrors the teacher's `Config` builder shape (`with_*` methods, a
//! `validate()` pass, serde support) but scoped to what the hierarchical
//! search actually needs to tune.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache entry TTL for a resolved cell's place list (spec §3, §4.4).
pub const PLACES_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Lease TTL for the single-flight lock (spec §3, §4.4).
pub const LOCK_TTL: Duration = Duration::from_secs(10);

/// Lock-acquisition poll interval and overall timeout (spec §4.4).
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const LOCK_POLL_TIMEOUT: Duration = Duration::from_secs(3);

/// Default recursion depth for the hierarchical walk (spec §4.3).
const DEFAULT_MAX_RECURSION_LEVEL: i32 = 16;

/// Tunables for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Deepest S2 level the recursive walk descends to before treating a
    /// cell as a leaf and fetching upstream (spec §4.3, §9 open question:
    /// kept as a fixed constant by default, but exposed here as an
    /// overridable field the same way the teacher exposes
    /// `buffer_capacity`/`snapshot_interval_seconds`).
    #[serde(default = "SearchConfig::default_max_recursion_level")]
    pub max_recursion_level: i32,

    #[serde(default = "SearchConfig::default_places_ttl_secs")]
    pub places_ttl_secs: u64,

    #[serde(default = "SearchConfig::default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

impl SearchConfig {
    const fn default_max_recursion_level() -> i32 {
        DEFAULT_MAX_RECURSION_LEVEL
    }

    const fn default_places_ttl_secs() -> u64 {
        PLACES_TTL.as_secs()
    }

    const fn default_lock_ttl_secs() -> u64 {
        LOCK_TTL.as_secs()
    }

    pub fn with_max_recursion_level(mut self, level: i32) -> Self {
        self.max_recursion_level = level;
        self
    }

    pub fn places_ttl(&self) -> Duration {
        Duration::from_secs(self.places_ttl_secs)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(10..=24).contains(&self.max_recursion_level) {
            return Err(format!(
                "max_recursion_level must be within [10, 24], got {}",
                self.max_recursion_level
            ));
        }
        if self.places_ttl_secs == 0 {
            return Err("places_ttl_secs must be greater than zero".to_string());
        }
        if self.lock_ttl_secs == 0 {
            return Err("lock_ttl_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_recursion_level: Self::default_max_recursion_level(),
            places_ttl_secs: Self::default_places_ttl_secs(),
            lock_ttl_secs: Self::default_lock_ttl_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SearchConfig::default();
        assert_eq!(config.max_recursion_level, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_recursion_level_out_of_range() {
        let config = SearchConfig::default().with_max_recursion_level(5);
        assert!(config.validate().is_err());
    }
}
