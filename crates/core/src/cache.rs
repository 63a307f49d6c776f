//! The `PlacesCache` contract and its backends (spec §4.4).
//!
//! Mirrors the teacher's `StorageBackend` trait shape (crates/core/storage/mod.rs):
//! one trait, one in-process backend for tests and small deployments, and an
//! optional networked backend behind a feature flag. Unlike the teacher's
//! byte-oriented `StorageBackend`, this trait is typed directly in terms of
//! `Place` lists, since every value this cache ever stores is a places list
//! or a lease token.

use crate::error::CacheError;
use async_trait::async_trait;
use nearby_types::Place;
use std::time::Duration;

/// Outcome of a cache read (spec §4.4: `get(K) -> Hit | Miss | Corrupt`).
/// `Corrupt` is not an error: callers treat it exactly like `Miss`, just
/// without clobbering the broken entry (spec §4.3 "On corrupted value").
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(Vec<Place>),
    Miss,
    Corrupt,
}

/// Read-through/write-through cache of places lists, keyed by S2 cell
/// token, plus the single-flight lease primitives used to coalesce
/// concurrent writers of the same key (spec §4.4).
#[async_trait]
pub trait PlacesCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError>;

    async fn set(&self, key: &str, places: &[Place], ttl: Duration) -> Result<(), CacheError>;

    /// Atomic set-if-absent with `ttl`. Returns `Some(lease_token)` on
    /// success, `None` on contention (someone else holds the lease). Never
    /// blocks or polls; that is the caller's responsibility (spec §4.4).
    async fn acquire_lock(&self, key: &str, ttl: Duration) -> Result<Option<String>, CacheError>;

    /// Compare-and-delete: remove `key` only if its current value equals
    /// `lease_token`. A mismatch (lease expired and retaken, or never held)
    /// is not an error, just a no-op.
    async fn release_lock(&self, key: &str, lease_token: &str) -> Result<(), CacheError>;
}

/// Lock key suffix (spec §6 "Cache key format").
pub fn lock_key(cell_token: &str) -> String {
    format!("{cell_token}:lock")
}

mod memory;
pub use memory::MemoryPlacesCache;

#[cfg(feature = "redis-backend")]
mod redis_backend;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisPlacesCache;
