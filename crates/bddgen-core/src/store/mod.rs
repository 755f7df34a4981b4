//! Persisted stores
//!
//! The change-detection cache and the conversation memory are the only
//! cross-invocation state in the system, each a single JSON document
//! with an explicit load/save lifecycle.

pub mod cache;
pub mod memory;

pub use cache::{
    remove_stale_features, should_regenerate, CacheDocument, CacheStore, CachedGraph,
    ChangeSignals, FileRecord, GraphCaches,
};
pub use memory::{MemoryStore, Turn};
