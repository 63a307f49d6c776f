//! Server configuration, loaded from the environment at startup (spec §6).
//!
//! Mirrors the validate-after-build shape of the teacher's
//! `crates/core/config.rs::Config`, but sourced from environment variables
//! rather than a config file, since this is the transport/session layer's
//! own config, not the engine's.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_REDIS_URL: &str = "redis://redis:6379/0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_PLACES_API_KEY_ENV: &str = "PLACES_API_KEY";
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 25;
const DEFAULT_MAX_RECURSION_LEVEL: i32 = 16;

/// Environment-driven configuration for the `nearby-server` binary (spec
/// §6). `redis_url`, `port`, and the places-API credential env var name are
/// the only fields the spec calls out; the rest are ambient server
/// tunables in the same spirit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub redis_url: String,
    pub port: u16,
    /// Name of the environment variable holding the upstream places-API
    /// credential. The credential itself is never read by this crate
    /// (spec §1: upstream HTTP/auth details are out of scope); only
    /// whether the named variable is set matters, to decide between a
    /// wired-in fetcher and `NullUpstreamFetcher`.
    pub places_api_key_env: String,
    pub session_idle_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub max_recursion_level: i32,
}

impl ServerConfig {
    /// Build from environment variables, falling back to spec defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            redis_url,
            port,
            places_api_key_env: DEFAULT_PLACES_API_KEY_ENV.to_string(),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            max_recursion_level: DEFAULT_MAX_RECURSION_LEVEL,
        }
    }

    /// Whether the configured places-API credential env var is actually
    /// set (spec §6: "absent ⇒ fetcher returns an unauthorized error").
    pub fn places_api_credential_present(&self) -> bool {
        std::env::var(&self.places_api_key_env).is_ok()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(10..=24).contains(&self.max_recursion_level) {
            return Err(format!(
                "max_recursion_level must be within [10, 24], got {}",
                self.max_recursion_level
            ));
        }
        if self.redis_url.is_empty() {
            return Err("redis_url must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            port: DEFAULT_PORT,
            places_api_key_env: DEFAULT_PLACES_API_KEY_ENV.to_string(),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            max_recursion_level: DEFAULT_MAX_RECURSION_LEVEL,
        }
    }
}
