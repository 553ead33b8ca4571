//! LinkCache - memoized link fetches owned by a record or response.

use std::collections::VecDeque;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::trace;

use crate::response::Response;

/// An in-flight or completed link fetch that can be awaited many times.
pub type SharedResponse = Shared<BoxFuture<'static, Response>>;

/// Bounded map of link name to its fetch.
///
/// Entries are only replaced by a forced fetch or dropped by explicit
/// invalidation or by eviction of the oldest entry once `capacity` is
/// exceeded. Nothing expires on its own.
pub struct LinkCache {
    capacity: usize,
    entries: Mutex<VecDeque<(String, SharedResponse)>>,
}

impl Default for LinkCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkCache {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Return the cached fetch for `key`, or start a new one with `fetch`.
    ///
    /// `force` discards any cached entry first.
    pub fn get_or_fetch<F>(&self, key: &str, force: bool, fetch: F) -> SharedResponse
    where
        F: FnOnce() -> BoxFuture<'static, Response>,
    {
        let mut entries = self.entries.lock();

        if !force {
            if let Some((_, cached)) = entries.iter().find(|(k, _)| k == key) {
                trace!(key, "link cache hit");
                return cached.clone();
            }
        }

        entries.retain(|(k, _)| k != key);
        let request = fetch().shared();
        entries.push_back((key.to_string(), request.clone()));
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        request
    }

    /// Drop the entry for `key`. Returns true if it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        entries.len() != before
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.lock().retain(|(k, _)| !k.starts_with(prefix));
    }

    pub fn invalidate_all(&self) {
        // Entries can own the cache's owner; drop them unlocked.
        let entries = std::mem::take(&mut *self.entries.lock());
        drop(entries);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
