//! Cache Item Module
//!
//! Defines the structure for individual cache items with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Item ==
/// A single stored entry: key, encoded value and absolute expiration time.
///
/// Expiration follows the wall clock, so a system clock step moves every
/// item's effective TTL with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    /// Unique key within the cache
    pub key: String,
    /// Encoded value (codec output)
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheItem {
    // == Constructor ==
    /// Creates a new item expiring `ttl` from now.
    ///
    /// TTLs below one millisecond are rounded up to one millisecond.
    pub fn new(key: String, value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key,
            value,
            expires_at: current_timestamp_ms().saturating_add(ttl_to_ms(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// An item is expired once the current time is strictly past `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts a TTL into whole milliseconds, rounding sub-millisecond values up.
pub(crate) fn ttl_to_ms(ttl: Duration) -> u64 {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !ttl.is_zero() {
        1
    } else {
        ms
    }
}
