//! Expiry Index Module
//!
//! Orders cached keys by absolute expiration time for eviction and sweeping.

use std::collections::{BTreeSet, HashMap};

// == Expiry Index ==
/// Priority structure of `(key, expires_at)` pairs, soonest expiry first.
///
/// The ordered set gives the minimum in O(log n); the side map lets a key be
/// removed from anywhere in the order without a scan.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// Entries ordered by expiration, ties broken by key
    order: BTreeSet<(u64, String)>,
    /// Current expiration per tracked key
    expires_at: HashMap<String, u64>,
}

impl ExpiryIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Starts tracking `key` with the given expiration.
    ///
    /// Callers remove any previous tracking for the key first. If they do not,
    /// the new expiration replaces the old one.
    pub fn insert(&mut self, key: &str, expires_at: u64) {
        if let Some(previous) = self.expires_at.insert(key.to_string(), expires_at) {
            self.order.remove(&(previous, key.to_string()));
        }
        self.order.insert((expires_at, key.to_string()));
    }

    // == Remove ==
    /// Stops tracking `key`. Returns its expiration if it was tracked.
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        let expires_at = self.expires_at.remove(key)?;
        self.order.remove(&(expires_at, key.to_string()));
        Some(expires_at)
    }

    // == Peek Min ==
    /// Returns the key expiring soonest, without removing it.
    pub fn peek_min(&self) -> Option<(&str, u64)> {
        self.order
            .first()
            .map(|(expires_at, key)| (key.as_str(), *expires_at))
    }

    // == Pop Min ==
    /// Removes and returns the key expiring soonest.
    pub fn pop_min(&mut self) -> Option<(String, u64)> {
        let (expires_at, key) = self.order.pop_first()?;
        self.expires_at.remove(&key);
        Some((key, expires_at))
    }

    // == Pop Expired ==
    /// Removes and returns every key whose expiration is strictly before `now_ms`,
    /// in expiration order.
    pub fn pop_expired(&mut self, now_ms: u64) -> Vec<(String, u64)> {
        let mut expired = Vec::new();
        while let Some((_, expires_at)) = self.peek_min() {
            if expires_at >= now_ms {
                break;
            }
            if let Some(entry) = self.pop_min() {
                expired.push(entry);
            }
        }
        expired
    }

    /// Returns the tracked expiration of `key`.
    pub fn expires_at(&self, key: &str) -> Option<u64> {
        self.expires_at.get(key).copied()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Drops all tracking.
    pub fn clear(&mut self) {
        self.order.clear();
        self.expires_at.clear();
    }
}
