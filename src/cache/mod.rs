//! Bounded recency (LRU) cache
//!
//! Entries live in a slot vector threaded by a doubly-linked recency list,
//! with a hash index from key to slot. The list head is the least recently
//! used entry and the tail the most recently used one, so `get`, `put` and
//! eviction are all O(1).

pub mod store;

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};

/// Default number of commit details kept in memory
pub const DEFAULT_CAPACITY: usize = 50;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity cache evicting the least recently used entry on overflow
#[derive(Debug, Clone)]
pub struct RecencyCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    head: usize,
    tail: usize,
}

impl<K: Hash + Eq + Clone, V> RecencyCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// Fails with [`Error::Configuration`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Configuration(
                "cache capacity must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
        })
    }

    /// Look up a value, marking it most recently used on a hit.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.touch(slot);
        Some(&self.slots[slot].value)
    }

    /// Check for a key without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or replace a value, making it most recently used.
    ///
    /// When a new key arrives at capacity the least recently used entry is
    /// evicted first and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            self.slots[slot].value = value;
            self.touch(slot);
            return None;
        }

        if self.slots.len() < self.capacity {
            let slot = self.slots.len();
            self.slots.push(Slot {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.index.insert(key, slot);
            self.push_back(slot);
            return None;
        }

        // Full: recycle the head slot for the new entry
        let slot = self.head;
        self.unlink(slot);
        let old_key = std::mem::replace(&mut self.slots[slot].key, key.clone());
        let old_value = std::mem::replace(&mut self.slots[slot].value, value);
        self.index.remove(&old_key);
        self.index.insert(key, slot);
        self.push_back(slot);

        Some((old_key, old_value))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate entries from least to most recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.slots.len(),
        }
    }

    fn touch(&mut self, slot: usize) {
        if slot != self.tail {
            self.unlink(slot);
            self.push_back(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[slot].prev = NIL;
        self.slots[slot].next = NIL;
    }

    fn push_back(&mut self, slot: usize) {
        self.slots[slot].prev = self.tail;
        self.slots[slot].next = NIL;
        if self.tail == NIL {
            self.head = slot;
        } else {
            self.slots[self.tail].next = slot;
        }
        self.tail = slot;
    }
}

/// Iterator over cache entries, least recently used first
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.slots[self.cursor];
        self.cursor = slot.next;
        self.remaining -= 1;
        Some((&slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: Hash + Eq + Clone, V> IntoIterator for &'a RecencyCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
