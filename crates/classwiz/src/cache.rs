//! Least-recently-used memoization cache for converter results.
//!
//! Recency is tracked with a monotonically increasing tick per access; the
//! entry with the smallest tick is evicted once capacity is exceeded.

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::debug;

/// Cache entry with its last access tick
struct Slot<V> {
    value: V,
    tick: u64,
}

/// Bounded (or unbounded) LRU map
pub struct LruCache<K, V> {
    /// Maximum number of entries; `None` = unbounded
    capacity: Option<usize>,
    entries: FxHashMap<K, Slot<V>>,
    /// Access tick to key, oldest first
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            entries: FxHashMap::default(),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Get a value, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<V> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        self.order.remove(&slot.tick);
        slot.tick = tick;
        self.order.insert(tick, key.clone());
        Some(slot.value.clone())
    }

    /// Insert a value, evicting the least recently used entry when full
    pub fn insert(&mut self, key: K, value: V) {
        let tick = self.next_tick();
        if let Some(old) = self.entries.insert(key.clone(), Slot { value, tick }) {
            self.order.remove(&old.tick);
        }
        self.order.insert(tick, key);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let Some((_, oldest)) = self.order.pop_first() else {
                    break;
                };
                self.entries.remove(&oldest);
                debug!(capacity, "evicted least recently used cache entry");
            }
        }
    }

    /// Check presence without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
