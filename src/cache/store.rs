//! Item Store Module
//!
//! Keyed storage of cache items behind a small trait so the engine does not
//! depend on a particular indexing mechanism.

use std::collections::HashMap;

use crate::cache::CacheItem;
use crate::error::Result;

// == Item Store Trait ==
/// A keyed store of cache items.
///
/// Implementations do not need their own locking: the engine only calls them
/// while holding its lock, with `&mut self` for every mutation.
pub trait ItemStore: Send + Sync {
    /// Inserts the item, replacing any existing item with the same key.
    fn put(&mut self, item: CacheItem) -> Result<()>;

    /// Looks up an item by key.
    fn get(&self, key: &str) -> Result<Option<CacheItem>>;

    /// Removes an item. Returns `false` if the key was absent.
    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Returns every stored item, in no particular order.
    fn all(&self) -> Result<Vec<CacheItem>>;

    /// Number of stored items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every stored item.
    fn clear(&mut self) -> Result<()> {
        for item in self.all()? {
            self.delete(&item.key)?;
        }
        Ok(())
    }
}

// == Memory Store ==
/// Default `HashMap`-backed item store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CacheItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with room for `capacity` items before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }
}

impl ItemStore for MemoryStore {
    fn put(&mut self, item: CacheItem) -> Result<()> {
        self.entries.insert(item.key.clone(), item);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<CacheItem>> {
        Ok(self.entries.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn all(&self) -> Result<Vec<CacheItem>> {
        Ok(self.entries.values().cloned().collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
