//! Cache backends.
//!
//! `TagCache` is the external key/value collaborator. Values are opaque
//! strings; ordering and expiry are not required. `NullCache` always misses
//! and `MemoryCache` keeps entries in an LRU map.

use std::sync::RwLock;

use lru::LruCache;
use thiserror::Error;

use crate::util::lock::rw_write;

use super::config::CacheConfig;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {message}")]
    Unavailable { message: String },
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

pub trait TagCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache that stores nothing; every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl TagCache for NullCache {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// In-process LRU cache.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, String>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl TagCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(rw_write(&self.entries, SOURCE, "get").get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }
}
