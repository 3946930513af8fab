//! TTL LRU Cache - An in-process, size-bounded key-value cache
//!
//! Provides per-item TTL expiration, expiration-ordered eviction and a
//! background expiry sweep.

#[macro_use]
mod logging;

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, CacheValue, ItemStore, MemoryStore};
pub use config::{CacheOptions, Config, EvictionHook, LogLevel};
pub use error::{CacheError, Result};
