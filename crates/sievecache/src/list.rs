//! Arena-backed doubly-linked list of cache entries.
//!
//! Entries live in a `Vec` slot arena and link to each other by index, so
//! relinking is O(1) with no raw pointers. Freed slots are recycled through a
//! free list. The list also carries the SIEVE hand (`cursor`), which is kept
//! valid across removals.

use std::collections::TryReserveError;
use std::time::Instant;

use crate::error::{Error, Result};

/// Stable handle to an entry in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// A cache slot
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) visited: bool,
    pub(crate) created_at: Instant,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, created_at: Instant) -> Self {
        Self {
            key,
            value,
            visited: false,
            created_at,
            prev: None,
            next: None,
        }
    }
}

/// Doubly-linked list with O(1) push, move and unlink
#[derive(Debug)]
pub(crate) struct OrderedList<K, V> {
    nodes: Vec<Option<Entry<K, V>>>,
    free_list: Vec<usize>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    cursor: Option<NodeId>,
    len: usize,
}

impl<K, V> OrderedList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            front: None,
            back: None,
            cursor: None,
            len: 0,
        }
    }

    /// Make sure one more entry can be linked without allocating.
    ///
    /// Also sizes the free list so a later `remove` never has to grow it.
    pub(crate) fn try_reserve_one(&mut self) -> std::result::Result<(), TryReserveError> {
        if self.free_list.is_empty() {
            self.nodes.try_reserve(1)?;
        }
        let want = self.nodes.len() + 1 - self.free_list.len();
        self.free_list.try_reserve(want)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn front(&self) -> Option<NodeId> {
        self.front
    }

    pub(crate) fn back(&self) -> Option<NodeId> {
        self.back
    }

    pub(crate) fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: Option<NodeId>) {
        self.cursor = cursor;
    }

    /// Neighbour towards the front
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|entry| entry.prev)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Entry<K, V>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Entry<K, V>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn push_front(&mut self, entry: Entry<K, V>) -> NodeId {
        let id = self.alloc_node(entry);
        self.link_front(id);
        id
    }

    pub(crate) fn push_back(&mut self, entry: Entry<K, V>) -> NodeId {
        let id = self.alloc_node(entry);
        self.link_back(id);
        id
    }

    pub(crate) fn move_to_back(&mut self, id: NodeId) {
        if self.back == Some(id) {
            return;
        }
        self.unlink(id);
        self.link_back(id);
    }

    /// Unlink and free an entry.
    ///
    /// If the cursor points at it, the cursor moves to its predecessor first.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Entry<K, V>> {
        self.get(id)?;
        if self.cursor == Some(id) {
            self.cursor = self.prev(id);
        }
        self.unlink(id);
        let entry = self.nodes[id.0].take();
        self.free_list.push(id.0);
        self.len -= 1;
        entry
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.front = None;
        self.back = None;
        self.cursor = None;
        self.len = 0;
    }

    /// Iterate from front to back
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            next: self.front,
        }
    }

    /// Walk the links and check they are symmetric and agree with `len`.
    pub(crate) fn check_links(&self) -> Result<()> {
        let mut count = 0;
        let mut prev: Option<NodeId> = None;

        // One extra step so a cycle shows up as a count mismatch
        for (id, entry) in self.iter().take(self.len + 1) {
            if entry.prev != prev {
                return Err(Error::Invariant(format!(
                    "slot {} has prev {:?}, expected {:?}",
                    id.0, entry.prev, prev
                )));
            }
            count += 1;
            prev = Some(id);
        }

        if count != self.len {
            return Err(Error::Invariant(format!(
                "walked {} entries, len is {}",
                count, self.len
            )));
        }
        if prev != self.back {
            return Err(Error::Invariant(format!(
                "back is {:?} but walk ended at {:?}",
                self.back, prev
            )));
        }
        if let Some(cursor) = self.cursor {
            if self.get(cursor).is_none() {
                return Err(Error::Invariant(format!(
                    "cursor points at freed slot {}",
                    cursor.0
                )));
            }
        }
        Ok(())
    }

    fn alloc_node(&mut self, entry: Entry<K, V>) -> NodeId {
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = Some(entry);
            NodeId(idx)
        } else {
            self.nodes.push(Some(entry));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn link_front(&mut self, id: NodeId) {
        let old_front = self.front;
        if let Some(node) = self.get_mut(id) {
            node.prev = None;
            node.next = old_front;
        }
        match old_front {
            Some(front_id) => {
                if let Some(front) = self.get_mut(front_id) {
                    front.prev = Some(id);
                }
            }
            None => self.back = Some(id),
        }
        self.front = Some(id);
    }

    fn link_back(&mut self, id: NodeId) {
        let old_back = self.back;
        if let Some(node) = self.get_mut(id) {
            node.prev = old_back;
            node.next = None;
        }
        match old_back {
            Some(back_id) => {
                if let Some(back) = self.get_mut(back_id) {
                    back.next = Some(id);
                }
            }
            None => self.front = Some(id),
        }
        self.back = Some(id);
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = match self.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.get_mut(prev_id) {
                    prev_node.next = next;
                }
            }
            None => self.front = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = self.get_mut(next_id) {
                    next_node.prev = prev;
                }
            }
            None => self.back = prev,
        }

        if let Some(node) = self.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }
}

/// Front-to-back iterator over entries
pub(crate) struct Iter<'a, K, V> {
    list: &'a OrderedList<K, V>,
    next: Option<NodeId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (NodeId, &'a Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.list.get(id)?;
        self.next = entry.next;
        Some((id, entry))
    }
}
