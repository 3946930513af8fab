//! Cache Engine Module
//!
//! Main cache engine combining the item store with the expiry index under a
//! single reader/writer lock.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::codec::{self, CacheValue};
use crate::cache::entry::{current_timestamp_ms, CacheItem};
use crate::cache::expiry::ExpiryIndex;
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::cache::store::{ItemStore, MemoryStore};
use crate::config::{CacheOptions, EvictionHook, LogLevel};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweep_task, SweepHandle};

/// Upper bound on entries preallocated by [`Cache::new`].
const PREALLOCATE_LIMIT: usize = 4096;

// == Guarded State ==
/// The item store and expiry index, always mutated together.
#[derive(Debug)]
struct CacheState<S> {
    store: S,
    expiry: ExpiryIndex,
}

// == Shared Core ==
/// State shared between the cache handle and its sweep task.
pub(crate) struct CacheShared<S> {
    state: RwLock<CacheState<S>>,
    capacity: usize,
    log_level: LogLevel,
    eviction_hook: Option<EvictionHook>,
    stats: StatsCounters,
}

impl<S: ItemStore> CacheShared<S> {
    pub(crate) fn log_level(&self) -> LogLevel {
        self.log_level
    }

    fn notify(&self, key: &str, value: Option<CacheValue>) {
        if let Some(hook) = &self.eviction_hook {
            hook(key, value);
        }
    }

    /// Decodes the stored value of `key` for the eviction hook, if there is one.
    fn resolve_for_hook(&self, state: &CacheState<S>, key: &str) -> Option<CacheValue> {
        self.eviction_hook.as_ref()?;
        match state.store.get(key) {
            Ok(Some(item)) => codec::decode(&item.value).ok(),
            _ => None,
        }
    }

    // == Enforce Capacity ==
    /// Evicts soonest-expiring keys until the store is within capacity.
    ///
    /// Returns the number of evicted entries. Must be called with the write lock held.
    fn enforce_capacity(&self, state: &mut CacheState<S>) -> usize {
        let mut evicted = 0;

        while state.store.len() > self.capacity {
            let Some((victim, expires_at)) = state.expiry.pop_min() else {
                break;
            };

            let value = self.resolve_for_hook(state, &victim);
            match state.store.delete(&victim) {
                Ok(true) => {
                    evicted += 1;
                    self.stats.record_eviction();
                    cache_log!(self.log_level, Debug, "Evicted key: {}", victim);
                    self.notify(&victim, value);
                }
                // Stale tracking for a key no longer stored
                Ok(false) => {}
                Err(err) => {
                    // Keep the victim tracked and stop, so it is retried by
                    // the next write instead of spinning here.
                    state.expiry.insert(&victim, expires_at);
                    cache_log!(
                        self.log_level,
                        Error,
                        "Failed to evict key {}: {}",
                        victim,
                        err
                    );
                    break;
                }
            }
        }

        evicted
    }

    // == Sweep Expired ==
    /// Removes every entry whose expiration has passed.
    ///
    /// Returns the number of entries removed. A key whose delete fails is
    /// logged and stays tracked, so the next pass retries it.
    pub(crate) fn sweep_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let (removed, failed) = {
            let mut state = self.state.write();
            let expired = state.expiry.pop_expired(now);
            let mut removed = 0;
            let mut failed = 0;

            for (key, expires_at) in expired {
                let value = self.resolve_for_hook(&state, &key);
                match state.store.delete(&key) {
                    Ok(true) => {
                        removed += 1;
                        self.stats.record_expiration();
                        self.notify(&key, value);
                    }
                    Ok(false) => {}
                    Err(err) => {
                        // Still stored, so keep it tracked for the next pass
                        state.expiry.insert(&key, expires_at);
                        failed += 1;
                        cache_log!(
                            self.log_level,
                            Error,
                            "Failed to remove expired key {}: {}",
                            key,
                            err
                        );
                    }
                }
            }

            self.stats.record_sweep(now);
            (removed, failed)
        };

        if removed > 0 || failed > 0 {
            cache_log!(
                self.log_level,
                Info,
                "Expiry sweep: removed {} expired entries, {} failures",
                removed,
                failed
            );
        } else {
            cache_log!(self.log_level, Debug, "Expiry sweep: no expired entries found");
        }

        removed
    }

    // == Expire On Read ==
    /// Removes `key` if it is still present and expired.
    fn expire_on_read(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();

        // Re-check under the exclusive lock: a concurrent Set may have
        // replaced the item, or another reader removed it already.
        let still_expired = match state.store.get(key)? {
            Some(item) => item.is_expired(),
            None => false,
        };
        if !still_expired {
            return Ok(());
        }

        state.store.delete(key)?;
        state.expiry.remove(key);
        self.stats.record_expiration();
        cache_log!(self.log_level, Debug, "Expired key on read: {}", key);
        self.notify(key, None);
        Ok(())
    }
}

// == Cache ==
/// Size-bounded key-value cache with per-item TTL.
///
/// When the cache holds more than `capacity` entries, the entries expiring
/// soonest are evicted first. Access does not affect eviction order.
///
/// The cache owns a background sweep on the ambient Tokio runtime. Call
/// [`Cache::shutdown`] to stop and join it; dropping the cache only signals it.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use ttl_lru_cache::{Cache, CacheOptions, CacheValue};
///
/// #[tokio::main]
/// async fn main() -> ttl_lru_cache::Result<()> {
///     let cache = Cache::new(100, CacheOptions::default())?;
///     cache.set("answer", 42, Duration::from_secs(60))?;
///     assert_eq!(cache.get("answer")?, CacheValue::Integer(42));
///     cache.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Cache<S: ItemStore + 'static = MemoryStore> {
    shared: Arc<CacheShared<S>>,
    sweeper: SweepHandle,
}

impl Cache<MemoryStore> {
    // == Constructor ==
    /// Creates a cache backed by a [`MemoryStore`].
    ///
    /// # Errors
    /// - `InvalidArgument` if `capacity` is zero or the sweep interval is zero
    /// - `NoRuntime` if called outside a Tokio runtime
    pub fn new(capacity: usize, options: CacheOptions) -> Result<Self> {
        let store = MemoryStore::with_capacity(capacity.min(PREALLOCATE_LIMIT));
        Self::with_store(store, capacity, options)
    }
}

impl<S: ItemStore + 'static> Cache<S> {
    /// Creates a cache on top of a caller-supplied item store.
    ///
    /// The store should start empty; existing items are not tracked for expiry.
    pub fn with_store(store: S, capacity: usize, options: CacheOptions) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "cache capacity must be positive".to_string(),
            ));
        }

        let shared = Arc::new(CacheShared {
            state: RwLock::new(CacheState {
                store,
                expiry: ExpiryIndex::new(),
            }),
            capacity,
            log_level: options.log_level,
            eviction_hook: options.eviction_hook,
            stats: StatsCounters::default(),
        });

        let sweeper = spawn_sweep_task(Arc::clone(&shared), options.sweep_interval)?;
        cache_log!(
            shared.log_level,
            Info,
            "Cache created: capacity={}, sweep_interval={:?}",
            capacity,
            options.sweep_interval
        );

        Ok(Self { shared, sweeper })
    }

    // == Set ==
    /// Stores a value under `key` for `ttl`.
    ///
    /// An existing entry for the key is replaced and its expiry reset. If the
    /// cache then exceeds capacity, entries are evicted soonest-expiry first,
    /// which can include the entry just written.
    ///
    /// # Errors
    /// - `InvalidArgument` if `ttl` is zero
    /// - `Serialization` if the value cannot be encoded; nothing is stored
    /// - `Storage` if the item store rejects the write; nothing is stored
    pub fn set(&self, key: impl Into<String>, value: impl Into<CacheValue>, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidArgument("ttl must be positive".to_string()));
        }

        let key = key.into();
        let value = value.into();
        let data = codec::encode(&value)?;

        let evicted = {
            let mut state = self.shared.state.write();
            let item = CacheItem::new(key.clone(), data, ttl);
            let expires_at = item.expires_at;

            state.store.put(item)?;
            state.expiry.remove(&key);
            state.expiry.insert(&key, expires_at);

            self.shared.enforce_capacity(&mut state)
        };

        cache_log!(
            self.shared.log_level,
            Debug,
            "Set key: {}, kind: {}, TTL: {:?}, evicted: {}",
            key,
            value.kind(),
            ttl,
            evicted
        );
        Ok(())
    }

    /// Serializes `value` as a structured value and stores it.
    pub fn set_structured<T: Serialize + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.set(key, CacheValue::structured(value)?, ttl)
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// An expired entry is removed on the spot.
    ///
    /// # Errors
    /// - `NotFound` if the key is absent
    /// - `Expired` if the key was present but past its TTL
    /// - `Serialization` if the stored bytes cannot be decoded
    pub fn get(&self, key: &str) -> Result<CacheValue> {
        let now = current_timestamp_ms();
        {
            let state = self.shared.state.read();
            match state.store.get(key)? {
                None => {
                    self.shared.stats.record_miss();
                    cache_log!(self.shared.log_level, Debug, "Get key: {} (not found)", key);
                    return Err(CacheError::NotFound(key.to_string()));
                }
                Some(item) if !item.is_expired_at(now) => {
                    let value = codec::decode(&item.value)?;
                    self.shared.stats.record_hit();
                    cache_log!(self.shared.log_level, Debug, "Get key: {}", key);
                    return Ok(value);
                }
                Some(_) => {}
            }
        }

        // Expired: removal needs the exclusive lock
        self.shared.stats.record_miss();
        self.shared.expire_on_read(key)?;
        Err(CacheError::Expired(key.to_string()))
    }

    /// Retrieves a value and deserializes it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)?.deserialize_into()
    }

    /// Returns true if `key` is present and not expired. Never mutates.
    pub fn contains(&self, key: &str) -> bool {
        let state = self.shared.state.read();
        matches!(state.store.get(key), Ok(Some(item)) if !item.is_expired())
    }

    // == Delete ==
    /// Removes `key`. Returns `false` if it was not present.
    ///
    /// The eviction hook is not called for explicit deletes.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = {
            let mut state = self.shared.state.write();
            let removed = state.store.delete(key)?;
            state.expiry.remove(key);
            removed
        };

        cache_log!(self.shared.log_level, Debug, "Deleted key: {} (present: {})", key, removed);
        Ok(removed)
    }

    // == Clear ==
    /// Removes every entry and resets the expiry index.
    pub fn clear(&self) -> Result<()> {
        {
            let mut state = self.shared.state.write();
            state.store.clear()?;
            state.expiry.clear();
        }

        cache_log!(self.shared.log_level, Info, "Cache cleared");
        Ok(())
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.shared.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.len(), self.shared.capacity)
    }

    /// Runs one sweep pass immediately. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.shared.sweep_expired()
    }

    // == Shutdown ==
    /// Stops the background sweep and waits for it to exit.
    ///
    /// The cache stays usable afterwards; expired entries are then only removed
    /// on read or by [`Cache::sweep_expired`].
    pub async fn shutdown(&self) {
        self.sweeper.shutdown().await;
        cache_log!(self.shared.log_level, Info, "Cache sweep stopped");
    }

    /// Store length and expiry index length, which match outside a mutation.
    #[cfg(test)]
    pub(crate) fn tracked_len(&self) -> (usize, usize) {
        let state = self.shared.state.read();
        (state.store.len(), state.expiry.len())
    }

    #[cfg(test)]
    pub(crate) fn sweeper(&self) -> &SweepHandle {
        &self.sweeper
    }

    /// Returns true once the background sweep is no longer running.
    pub fn sweep_finished(&self) -> bool {
        self.sweeper.is_finished()
    }
}

impl<S: ItemStore + 'static> fmt::Debug for Cache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.shared.capacity)
            .field("len", &self.len())
            .field("log_level", &self.shared.log_level)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::thread::sleep;

    const HOUR: Duration = Duration::from_secs(3600);

    fn new_cache(capacity: usize) -> Cache {
        Cache::new(capacity, CacheOptions::new().with_log_level(LogLevel::Error)).unwrap()
    }

    type Evictions = Arc<Mutex<Vec<(String, Option<CacheValue>)>>>;

    fn cache_with_hook(capacity: usize) -> (Cache, Evictions) {
        let evicted: Evictions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let options = CacheOptions::new().with_eviction_hook(move |key, value| {
            sink.lock().push((key.to_string(), value));
        });
        (Cache::new(capacity, options).unwrap(), evicted)
    }

    #[tokio::test]
    async fn test_cache_new() {
        let cache = new_cache(10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 10);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejected() {
        let result = Cache::new(0, CacheOptions::new());
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = new_cache(10);

        let result = cache.set("key", "value", Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = new_cache(10);

        cache.set("key1", "value1", HOUR).unwrap();
        assert_eq!(cache.get("key1").unwrap(), CacheValue::from("value1"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = new_cache(10);
        assert!(matches!(cache.get("missing"), Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overwrite_resets_expiry() {
        let cache = new_cache(10);

        cache.set("key1", "value1", Duration::from_millis(30)).unwrap();
        cache.set("key1", "value2", HOUR).unwrap();

        sleep(Duration::from_millis(60));

        assert_eq!(cache.get("key1").unwrap(), CacheValue::from("value2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.shared.state.read().expiry.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_then_not_found() {
        let (cache, evicted) = cache_with_hook(10);

        cache.set("key1", "value1", Duration::from_millis(20)).unwrap();
        sleep(Duration::from_millis(50));

        assert!(matches!(cache.get("key1"), Err(CacheError::Expired(_))));
        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));

        // Lazy expiration reports no value
        assert_eq!(*evicted.lock(), vec![("key1".to_string(), None)]);
        assert!(cache.shared.state.read().expiry.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_soonest_expiry() {
        let (cache, evicted) = cache_with_hook(3);

        cache.set("long", 1, HOUR * 3).unwrap();
        cache.set("short", 2, HOUR).unwrap();
        cache.set("medium", 3, HOUR * 2).unwrap();
        cache.set("newest", 4, HOUR * 4).unwrap();

        assert_eq!(cache.len(), 3);
        assert!(matches!(cache.get("short"), Err(CacheError::NotFound(_))));
        assert!(cache.get("long").is_ok());
        assert!(cache.get("medium").is_ok());
        assert!(cache.get("newest").is_ok());

        // Capacity eviction passes the decoded value
        assert_eq!(
            *evicted.lock(),
            vec![("short".to_string(), Some(CacheValue::Integer(2)))]
        );
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_capacity_can_evict_new_key() {
        let cache = new_cache(2);

        cache.set("a", 1, HOUR).unwrap();
        cache.set("b", 2, HOUR).unwrap();
        cache.set("c", 3, Duration::from_secs(1)).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(matches!(cache.get("c"), Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_access_does_not_change_eviction_order() {
        let cache = new_cache(3);

        cache.set("key1", 1, HOUR).unwrap();
        sleep(Duration::from_millis(2));
        cache.set("key2", 2, HOUR).unwrap();
        sleep(Duration::from_millis(2));
        cache.set("key3", 3, HOUR).unwrap();

        // Reading key1 does not protect it
        cache.get("key1").unwrap();
        sleep(Duration::from_millis(2));
        cache.set("key4", 4, HOUR).unwrap();

        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));
        assert!(cache.get("key2").is_ok());
    }

    #[tokio::test]
    async fn test_delete() {
        let (cache, evicted) = cache_with_hook(10);

        cache.set("key1", "value1", HOUR).unwrap();
        assert!(cache.delete("key1").unwrap());
        assert!(!cache.delete("key1").unwrap());

        assert!(cache.is_empty());
        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));
        assert!(cache.shared.state.read().expiry.is_empty());
        assert!(evicted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = new_cache(10);

        cache.set("a", 1, HOUR).unwrap();
        cache.set("b", 2, HOUR).unwrap();
        cache.clear().unwrap();

        assert_eq!(cache.len(), 0);
        assert!(matches!(cache.get("a"), Err(CacheError::NotFound(_))));
        assert!(matches!(cache.get("b"), Err(CacheError::NotFound(_))));
        assert!(cache.shared.state.read().expiry.is_empty());
    }

    #[tokio::test]
    async fn test_contains_does_not_remove() {
        let cache = new_cache(10);

        cache.set("live", 1, HOUR).unwrap();
        cache.set("dead", 2, Duration::from_millis(10)).unwrap();
        sleep(Duration::from_millis(30));

        assert!(cache.contains("live"));
        assert!(!cache.contains("dead"));
        assert!(!cache.contains("missing"));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_manual_sweep() {
        let (cache, evicted) = cache_with_hook(10);

        cache.set("a", "x", Duration::from_millis(10)).unwrap();
        cache.set("b", "y", Duration::from_millis(10)).unwrap();
        cache.set("c", "z", HOUR).unwrap();
        sleep(Duration::from_millis(30));

        assert_eq!(cache.sweep_expired(), 2);
        assert_eq!(cache.len(), 1);

        // Sweep passes the decoded value
        let mut seen = evicted.lock().clone();
        seen.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Some(CacheValue::from("x"))),
                ("b".to_string(), Some(CacheValue::from("y"))),
            ]
        );
        assert_eq!(cache.stats().expirations, 2);
    }

    #[tokio::test]
    async fn test_structured_values() {
        #[derive(Debug, Serialize, serde::Deserialize, PartialEq)]
        struct User {
            name: String,
            age: u32,
        }

        let cache = new_cache(10);
        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        cache.set_structured("user", &user, HOUR).unwrap();
        assert_eq!(cache.get_as::<User>("user").unwrap(), user);
    }

    #[tokio::test]
    async fn test_unencodable_value_leaves_no_entry() {
        let cache = new_cache(10);
        let mut bad = std::collections::BTreeMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");

        let result = cache.set_structured("bad", &bad, HOUR);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = new_cache(10);

        cache.set("key1", "value1", HOUR).unwrap();
        cache.get("key1").unwrap(); // hit
        let _ = cache.get("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.capacity, 10);
    }

    /// Store whose writes can be made to fail.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_puts: bool,
        /// Keys whose next delete fails
        fail_delete_once: HashSet<String>,
    }

    impl ItemStore for FailingStore {
        fn put(&mut self, item: CacheItem) -> Result<()> {
            if self.fail_puts {
                return Err(CacheError::Storage("write rejected".to_string()));
            }
            self.inner.put(item)
        }
        fn get(&self, key: &str) -> Result<Option<CacheItem>> {
            self.inner.get(key)
        }
        fn delete(&mut self, key: &str) -> Result<bool> {
            if self.fail_delete_once.remove(key) {
                return Err(CacheError::Storage("delete rejected".to_string()));
            }
            self.inner.delete(key)
        }
        fn all(&self) -> Result<Vec<CacheItem>> {
            self.inner.all()
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_no_entry() {
        let store = FailingStore {
            fail_puts: true,
            ..Default::default()
        };
        let cache = Cache::with_store(store, 10, CacheOptions::new()).unwrap();

        let result = cache.set("key", "value", HOUR);
        assert!(matches!(result, Err(CacheError::Storage(_))));
        assert!(cache.is_empty());
        assert!(cache.shared.state.read().expiry.is_empty());
    }

    #[tokio::test]
    async fn test_with_store_uses_default_clear() {
        let cache = Cache::with_store(FailingStore::default(), 10, CacheOptions::new()).unwrap();

        cache.set("a", 1, HOUR).unwrap();
        cache.set("b", 2, HOUR).unwrap();
        cache.clear().unwrap();

        assert!(cache.is_empty());
    }

    fn failing_cache(capacity: usize) -> Cache<FailingStore> {
        let options = CacheOptions::new().with_log_level(LogLevel::Error);
        Cache::with_store(FailingStore::default(), capacity, options).unwrap()
    }

    fn fail_next_delete(cache: &Cache<FailingStore>, key: &str) {
        cache
            .shared
            .state
            .write()
            .store
            .fail_delete_once
            .insert(key.to_string());
    }

    #[tokio::test]
    async fn test_sweep_skips_failed_delete_and_retries() {
        let cache = failing_cache(10);

        cache.set("a", 1, Duration::from_millis(5)).unwrap();
        cache.set("b", 2, Duration::from_millis(5)).unwrap();
        cache.set("c", 3, Duration::from_millis(5)).unwrap();
        cache.set("live", 4, HOUR).unwrap();
        fail_next_delete(&cache, "b");
        sleep(Duration::from_millis(30));

        // The failing key is skipped, the rest of the pass still runs
        assert_eq!(cache.sweep_expired(), 2);
        assert_eq!(cache.tracked_len(), (2, 2));

        // Still tracked, so the next pass removes it
        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.tracked_len(), (1, 1));
        assert!(cache.get("live").is_ok());
    }

    #[tokio::test]
    async fn test_failed_eviction_keeps_victim_tracked() {
        let cache = failing_cache(2);

        cache.set("a", 1, HOUR).unwrap();
        cache.set("b", 2, HOUR * 2).unwrap();
        fail_next_delete(&cache, "a");

        // The write itself succeeds even though eviction failed
        cache.set("c", 3, HOUR * 3).unwrap();
        assert_eq!(cache.tracked_len(), (3, 3));
        assert_eq!(cache.stats().evictions, 0);

        // The next write evicts the earliest keys again
        cache.set("d", 4, HOUR * 4).unwrap();
        assert_eq!(cache.tracked_len(), (2, 2));
        assert!(matches!(cache.get("a"), Err(CacheError::NotFound(_))));
        assert!(matches!(cache.get("b"), Err(CacheError::NotFound(_))));
        assert!(cache.get("c").is_ok());
        assert!(cache.get("d").is_ok());
    }
}
