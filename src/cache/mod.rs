//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and expiration-ordered eviction.

mod codec;
mod engine;
mod entry;
mod expiry;
mod stats;
mod store;


// Re-export public types
pub use codec::{decode, encode, CacheValue};
pub use engine::Cache;
pub use entry::{current_timestamp_ms, CacheItem};
pub use expiry::ExpiryIndex;
pub use stats::CacheStats;
pub use store::{ItemStore, MemoryStore};

pub(crate) use engine::CacheShared;
