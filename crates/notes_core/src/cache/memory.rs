//! Process-local hash cache.
//!
//! Mirrors the Redis hash semantics the repository needs: a key exists
//! while it holds at least one field, and every operation runs under one
//! lock so each call is atomic.

use super::{CacheError, CacheResult, HashCache};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Records = HashMap<String, HashMap<String, String>>;

/// In-memory `HashCache` suitable for tests and single-process use.
#[derive(Debug, Default)]
pub struct InMemoryHashCache {
    records: Mutex<Records>,
}

impl InMemoryHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every key currently holding a record, sorted.
    pub fn keys(&self) -> CacheResult<Vec<String>> {
        let records = self.lock()?;
        let mut keys: Vec<String> = records.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Drops every record.
    pub fn flush(&self) -> CacheResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Records>> {
        self.records.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl HashCache for InMemoryHashCache {
    fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        Ok(self.lock()?.get(key).cloned().unwrap_or_default())
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        self.lock()?
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut records = self.lock()?;
        let removed = keys
            .iter()
            .filter(|key| records.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }

    fn hash_set_all(&self, key: &str, fields: &[(&str, String)]) -> CacheResult<()> {
        let mut records = self.lock()?;
        let record = records.entry(key.to_string()).or_default();
        for (field, value) in fields {
            record.insert((*field).to_string(), value.clone());
        }
        Ok(())
    }
}
