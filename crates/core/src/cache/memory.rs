//! In-process `PlacesCache` backend, grounded on the teacher's
//! `MemoryBackend` (crates/core/storage/memory.rs): a `DashMap` guarded by
//! nothing more than the map's own internal sharding, with expiry checked
//! lazily on read.

use super::{CacheLookup, PlacesCache};
use crate::error::CacheError;
use async_trait::async_trait;
use dashmap::DashMap;
use nearby_types::Place;
use std::time::{Duration, Instant};
use uuid::Uuid;

struct PlacesEntry {
    places: Vec<Place>,
    expires_at: Instant,
}

struct LockEntry {
    lease_token: String,
    expires_at: Instant,
}

/// Default in-memory `PlacesCache`, suitable for single-process deployments
/// and for every test in this workspace that does not specifically target
/// the Redis backend.
#[derive(Default)]
pub struct MemoryPlacesCache {
    places: DashMap<String, PlacesEntry>,
    locks: DashMap<String, LockEntry>,
    /// Keys marked corrupt by `force_corrupt` for test coverage of the
    /// spec's corrupt-value path; the real backend stores typed values and
    /// can never produce this on its own.
    corrupt: DashMap<String, ()>,
}

impl MemoryPlacesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only hook: mark `key` as decoding to a corrupt value on the
    /// next `get`, without touching whatever is actually stored under it.
    #[cfg(test)]
    pub fn force_corrupt(&self, key: &str) {
        self.corrupt.insert(key.to_string(), ());
    }
}

#[async_trait]
impl PlacesCache for MemoryPlacesCache {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
        if self.corrupt.contains_key(key) {
            return Ok(CacheLookup::Corrupt);
        }

        match self.places.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                Ok(CacheLookup::Hit(entry.places.clone()))
            }
            Some(_) => {
                self.places.remove(key);
                Ok(CacheLookup::Miss)
            }
            None => Ok(CacheLookup::Miss),
        }
    }

    async fn set(&self, key: &str, places: &[Place], ttl: Duration) -> Result<(), CacheError> {
        self.places.insert(
            key.to_string(),
            PlacesEntry {
                places: places.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn acquire_lock(&self, key: &str, ttl: Duration) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(existing) = self.locks.get(key) {
            if existing.expires_at > now {
                return Ok(None);
            }
        }

        let lease_token = Uuid::new_v4().to_string();
        self.locks.insert(
            key.to_string(),
            LockEntry {
                lease_token: lease_token.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(lease_token))
    }

    async fn release_lock(&self, key: &str, lease_token: &str) -> Result<(), CacheError> {
        if let Some(entry) = self.locks.get(key) {
            if entry.lease_token != lease_token {
                return Ok(());
            }
        } else {
            return Ok(());
        }
        self.locks.remove_if(key, |_, v| v.lease_token == lease_token);
        Ok(())
    }
}
