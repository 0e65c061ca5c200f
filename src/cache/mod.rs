//! Tag cache layer.
//!
//! - `TagCache`: the external key/value collaborator (`NullCache`, `MemoryCache`)
//! - `CacheKey`: deterministic per-entity and aggregate keys
//! - `TypedCache`: JSON values, failures degrade to misses
//! - `CacheRegistry`: resolves a configured cache id to an instance

mod config;
mod keys;
mod registry;
mod store;
mod typed;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use registry::CacheRegistry;
pub use store::{CacheError, MemoryCache, NullCache, TagCache};
pub use typed::TypedCache;
