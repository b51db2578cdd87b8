//! Owning cache of compiled libraries keyed by source identifier.

use std::collections::{BTreeMap, btree_map};

use tracing::debug;

use crate::source::key_label;

/// Snapshot of cache occupancy and hit rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Map from identifier to library, iterated in ascending key order.
///
/// The cache is the sole owner of its libraries: callers only ever receive
/// borrows, and every library is released exactly once when it is replaced
/// or when the cache is dropped. The type is deliberately not `Clone`.
pub struct LibraryCache<L> {
    entries: BTreeMap<String, L>,
    hits: u64,
    misses: u64,
}

impl<L> Default for LibraryCache<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> LibraryCache<L> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Borrow the library cached under `key` without touching the counters.
    #[inline]
    pub fn lookup(&self, key: &str) -> Option<&L> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `library` under `key`, releasing any library it replaces.
    pub fn insert(&mut self, key: impl Into<String>, library: L) -> &L {
        match self.entries.entry(key.into()) {
            btree_map::Entry::Vacant(slot) => slot.insert(library),
            btree_map::Entry::Occupied(mut slot) => {
                debug!(key = %key_label(slot.key()), "replacing cached library");
                drop(slot.insert(library));
                slot.into_mut()
            }
        }
    }

    /// Return the cached library for `key`, building and inserting it on a miss.
    ///
    /// A failed build leaves the cache untouched, so a later call retries.
    /// A hit only looks the key up; it is copied into the cache on a miss.
    pub fn get_or_try_insert_with<E>(&mut self, key: &str, build: impl FnOnce() -> Result<L, E>) -> Result<&L, E> {
        if !self.entries.contains_key(key) {
            self.misses = self.misses.saturating_add(1);
            let library = build()?;
            return Ok(self.entries.entry(key.to_owned()).or_insert(library));
        }
        self.hits = self.hits.saturating_add(1);
        Ok(&self.entries[key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &L)> {
        self.entries.iter().map(|(key, library)| (key.as_str(), library))
    }

    pub fn libraries(&self) -> impl Iterator<Item = &L> {
        self.entries.values()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl<L> Drop for LibraryCache<L> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            debug!(count = self.entries.len(), "releasing cached libraries");
        }
    }
}

#[path = "cache.test.rs"]
mod tests;
