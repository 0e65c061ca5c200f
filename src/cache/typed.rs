//! Typed, failure-tolerant view over a `TagCache`.
//!
//! Values are stored as JSON. Backend errors and undecodable entries are
//! logged and reported as misses; cache trouble never fails an operation.

use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::keys::CacheKey;
use super::store::TagCache;

#[derive(Clone)]
pub struct TypedCache {
    inner: Arc<dyn TagCache>,
}

impl TypedCache {
    pub fn new(inner: Arc<dyn TagCache>) -> Self {
        Self { inner }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let rendered = key.to_string();

        let raw = match self.inner.get(&rendered) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!("taggable_cache_miss_total").increment(1);
                debug!(cache_key = %rendered, "Cache miss");
                return None;
            }
            Err(err) => {
                counter!("taggable_cache_error_total", "op" => "get").increment(1);
                warn!(cache_key = %rendered, error = %err, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!("taggable_cache_hit_total").increment(1);
                debug!(cache_key = %rendered, "Cache hit");
                Some(value)
            }
            Err(err) => {
                counter!("taggable_cache_miss_total").increment(1);
                warn!(
                    cache_key = %rendered,
                    error = %err,
                    "Undecodable cache entry, treating as miss"
                );
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        let rendered = key.to_string();

        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(cache_key = %rendered, error = %err, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(err) = self.inner.set(&rendered, encoded) {
            counter!("taggable_cache_error_total", "op" => "set").increment(1);
            warn!(cache_key = %rendered, error = %err, "Cache write failed");
        }
    }

    pub fn delete(&self, key: &CacheKey) {
        let rendered = key.to_string();

        if let Err(err) = self.inner.delete(&rendered) {
            counter!("taggable_cache_error_total", "op" => "delete").increment(1);
            warn!(cache_key = %rendered, error = %err, "Cache delete failed");
        } else {
            debug!(cache_key = %rendered, "Cache entry invalidated");
        }
    }
}
