//! LRU List Module
//!
//! Implements the recency ordering used for cache eviction.

use crate::cache::CacheEntry;

// == Node ==
/// Arena slot holding an entry and its links.
#[derive(Debug)]
struct Node<V> {
    entry: CacheEntry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU List ==
/// Doubly-linked list of cache entries ordered by recency of use.
///
/// Nodes live in a `Vec` arena and link to each other by index, so a handle
/// stays valid until its node is removed. Freed slots are recycled.
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruList<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<V> Default for LruList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Inserts an entry as the most recently used one and returns its handle.
    pub fn push_front(&mut self, entry: CacheEntry<V>) -> usize {
        let node = Node {
            entry,
            prev: None,
            next: self.head,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old_head) => {
                if let Some(node) = self.slots[old_head].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the entry behind `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) || self.node(idx).is_none() {
            return;
        }
        self.unlink(idx);

        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = self.head;
        }
        if let Some(old_head) = self.head {
            if let Some(node) = self.slots[old_head].as_mut() {
                node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    // == Remove ==
    /// Removes the node behind `idx` and hands its entry back.
    ///
    /// Returns None if the handle is stale.
    pub fn remove(&mut self, idx: usize) -> Option<CacheEntry<V>> {
        self.node(idx)?;
        self.unlink(idx);

        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.entry)
    }

    // == Navigation ==
    /// Handle of the most recently used entry.
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    /// Handle of the least recently used entry.
    pub fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Handle of the entry one step more recent than `idx`.
    pub fn prev(&self, idx: usize) -> Option<usize> {
        self.node(idx).and_then(|node| node.prev)
    }

    // == Access ==
    /// Borrows the entry behind `idx`, None for a stale handle.
    pub fn get(&self, idx: usize) -> Option<&CacheEntry<V>> {
        self.node(idx).map(|node| &node.entry)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut CacheEntry<V>> {
        self.slots
            .get_mut(idx)
            .and_then(Option::as_mut)
            .map(|node| &mut node.entry)
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Clear ==
    /// Drops every entry and releases all handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Length ==
    /// Returns the number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, idx: usize) -> Option<&Node<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    /// Detaches a node from its neighbours without freeing its slot.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`LruList`].
pub struct Iter<'a, V> {
    list: &'a LruList<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a CacheEntry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}
