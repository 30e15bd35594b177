//! Redis-backed hash cache (`redis` feature).
//!
//! Holds only a client; a connection is taken per call so the cache stays
//! free of in-process mutable state.

use super::{CacheResult, HashCache};
use redis::{Client, Commands, Connection};
use std::collections::HashMap;

/// `HashCache` over Redis hashes (`HGETALL`, `HSET`, `EXISTS`, `DEL`).
pub struct RedisHashCache {
    client: Client,
}

impl RedisHashCache {
    /// Builds a cache from a `redis://` URL. Does not connect yet.
    pub fn open(url: &str) -> CacheResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
        })
    }

    fn connection(&self) -> CacheResult<Connection> {
        Ok(self.client.get_connection()?)
    }
}

impl HashCache for RedisHashCache {
    fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        Ok(self.connection()?.hgetall(key)?)
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        self.connection()?.hset::<_, _, _, ()>(key, field, value)?;
        Ok(())
    }

    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.connection()?.exists(key)?)
    }

    fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        Ok(self.connection()?.del(keys)?)
    }

    fn hash_set_all(&self, key: &str, fields: &[(&str, String)]) -> CacheResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.connection()?
            .hset_multiple::<_, _, _, ()>(key, fields)?;
        Ok(())
    }
}
