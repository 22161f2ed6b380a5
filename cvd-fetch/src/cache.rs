//! The cache abstraction owned by the fetcher.

use cvd_core::RegionKey;
use std::cell::RefCell;
use std::collections::HashMap;

/// Per-region cache. Methods take `&self`; implementations use interior
/// mutability and are meant for a single thread.
pub trait RegionCache<V> {
    fn get(&self, key: &RegionKey) -> Option<V>;
    fn set(&self, key: RegionKey, value: V);
    /// Drop one entry; returns whether it was present.
    fn invalidate(&self, key: &RegionKey) -> bool;
    fn clear(&self);
}

/// In-memory [`RegionCache`] backed by a `HashMap`.
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: RefCell<HashMap<RegionKey, V>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        MemoryCache {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<V: Clone> RegionCache<V> for MemoryCache<V> {
    fn get(&self, key: &RegionKey) -> Option<V> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: RegionKey, value: V) {
        self.entries.borrow_mut().insert(key, value);
    }

    fn invalidate(&self, key: &RegionKey) -> bool {
        self.entries.borrow_mut().remove(key).is_some()
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
