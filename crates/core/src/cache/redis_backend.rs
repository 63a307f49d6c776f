//! Redis-backed `PlacesCache`, the production backend named by the spec's
//! `REDIS_URL` config (spec §6). Values are stored as JSON; the lease
//! release is a Lua compare-and-delete, with a read-then-delete fallback
//! documented but not needed here since `redis` supports `EVAL` directly.

use super::{CacheLookup, PlacesCache};
use crate::error::CacheError;
use async_trait::async_trait;
use nearby_types::Place;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use uuid::Uuid;

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// A `PlacesCache` backed by a shared Redis instance, for multi-process
/// deployments (spec §4.4, §6).
pub struct RedisPlacesCache {
    conn: ConnectionManager,
}

impl RedisPlacesCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(|e| CacheError::Transient {
            key: redis_url.to_string(),
            message: e.to_string(),
        })?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Transient {
                key: redis_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl PlacesCache for RedisPlacesCache {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> =
            conn.get(key).await.map_err(|e| CacheError::Transient {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        match raw {
            None => Ok(CacheLookup::Miss),
            Some(raw) => match serde_json::from_str::<Vec<Place>>(&raw) {
                Ok(places) => Ok(CacheLookup::Hit(places)),
                Err(_) => Ok(CacheLookup::Corrupt),
            },
        }
    }

    async fn set(&self, key: &str, places: &[Place], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(places).map_err(|e| CacheError::Transient {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let _: () = conn
            .set_ex(key, raw, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::Transient {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn acquire_lock(&self, key: &str, ttl: Duration) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let lease_token = Uuid::new_v4().to_string();

        let acquired: bool = redis::cmd("SET")
            .arg(key)
            .arg(&lease_token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map(|reply| reply.is_some())
            .map_err(|e| CacheError::Transient {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(if acquired { Some(lease_token) } else { None })
    }

    async fn release_lock(&self, key: &str, lease_token: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let script = redis::Script::new(RELEASE_SCRIPT);
        let _: i64 = script
            .key(key)
            .arg(lease_token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::Transient {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
