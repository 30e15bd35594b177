//! Key-value cache contract used by the cached note repository.
//!
//! # Responsibility
//! - Define the hash-record operations the repository relies on.
//! - Provide the process-local and Redis-backed implementations.
//! - Own the note cache key scheme and field-set codec.
//!
//! # Invariants
//! - `hash_get_all` on a missing key returns an empty map, not an error.
//! - Each single operation is atomic per key.
//! - The cache is never authoritative; any entry may be discarded.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
mod memory;
#[cfg(feature = "redis")]
mod redis_cache;

pub use memory::InMemoryHashCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisHashCache;

pub type CacheResult<T> = Result<T, CacheError>;

/// Transport or backend failure raised by a cache implementation.
#[derive(Debug)]
pub enum CacheError {
    /// A previous holder of the in-memory lock panicked.
    Poisoned,
    #[cfg(feature = "redis")]
    Redis(redis::RedisError),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poisoned => write!(f, "cache lock poisoned"),
            #[cfg(feature = "redis")]
            Self::Redis(err) => write!(f, "redis error: {err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Poisoned => None,
            #[cfg(feature = "redis")]
            Self::Redis(err) => Some(err),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self::Redis(value)
    }
}

/// Hash-record cache operations.
pub trait HashCache {
    /// Reads every field of `key`; empty when the key is absent.
    fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>>;
    /// Writes one field of `key`, creating the key when needed.
    fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()>;
    /// Returns whether `key` holds any record.
    fn exists(&self, key: &str) -> CacheResult<bool>;
    /// Removes every listed key and returns how many existed.
    fn delete(&self, keys: &[String]) -> CacheResult<u64>;

    /// Writes several fields of `key`.
    ///
    /// The default issues one `hash_set` per field; backends with a
    /// multi-field write override it.
    fn hash_set_all(&self, key: &str, fields: &[(&str, String)]) -> CacheResult<()> {
        for (field, value) in fields {
            self.hash_set(key, field, value)?;
        }
        Ok(())
    }
}

impl<T: HashCache + ?Sized> HashCache for &T {
    fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        (**self).hash_get_all(key)
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        (**self).hash_set(key, field, value)
    }

    fn exists(&self, key: &str) -> CacheResult<bool> {
        (**self).exists(key)
    }

    fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        (**self).delete(keys)
    }

    fn hash_set_all(&self, key: &str, fields: &[(&str, String)]) -> CacheResult<()> {
        (**self).hash_set_all(key, fields)
    }
}
