//! Cache instance registry.
//!
//! Maps the `cache_id` named in tagging options to a concrete cache. An empty
//! or unknown identifier resolves to `NullCache`, so a missing cache degrades
//! to direct storage reads instead of failing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::util::lock::{rw_read, rw_write};

use super::store::{NullCache, TagCache};

const SOURCE: &str = "cache::registry";

pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<dyn TagCache>>>,
}

impl CacheRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `cache` under `id`, replacing any previous binding.
    pub fn register(&self, id: impl Into<String>, cache: Arc<dyn TagCache>) {
        rw_write(&self.caches, SOURCE, "register").insert(id.into(), cache);
    }

    /// Look up a cache by identifier, falling back to `NullCache`.
    pub fn resolve(&self, id: &str) -> Arc<dyn TagCache> {
        if let Some(cache) = rw_read(&self.caches, SOURCE, "resolve").get(id) {
            return Arc::clone(cache);
        }

        debug!(cache_id = id, "Cache id not registered, using null cache");
        Arc::new(NullCache)
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
