//! Ordered queue primitive
//!
//! A singly linked list of [`EventId`]s whose links live outside the list
//! head, in whatever table owns the events (the [`Links`] trait). The same
//! head works as a FIFO (`push_back` + `pop_front`), a LIFO (`push_front` +
//! `pop_front`), or a sorted list (`insert_before_first`).
//!
//! Costs: push at either end, pop at the front, and insert/remove after a
//! known predecessor are O(1). Removing an arbitrary node or finding a
//! sorted insertion point scans from the head.
//!
//! The queue does not track membership; the owner of the links does. A
//! node must not be pushed into two queues at once.

use crate::EventId;

/// Storage for the `next` link of every node
pub trait Links {
    fn next(&self, node: EventId) -> Option<EventId>;
    fn set_next(&mut self, node: EventId, next: Option<EventId>);
}

/// Head of an intrusive singly linked list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Queue {
    head: Option<EventId>,
    tail: Option<EventId>,
    len: usize,
}

impl Queue {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn head(&self) -> Option<EventId> {
        self.head
    }

    pub fn tail(&self) -> Option<EventId> {
        self.tail
    }

    /// Appends `node` at the tail
    pub fn push_back<L: Links + ?Sized>(&mut self, links: &mut L, node: EventId) {
        links.set_next(node, None);
        match self.tail {
            Some(tail) => links.set_next(tail, Some(node)),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Prepends `node` at the head
    pub fn push_front<L: Links + ?Sized>(&mut self, links: &mut L, node: EventId) {
        links.set_next(node, self.head);
        self.head = Some(node);
        if self.tail.is_none() {
            self.tail = Some(node);
        }
        self.len += 1;
    }

    /// Detaches and returns the head
    pub fn pop_front<L: Links + ?Sized>(&mut self, links: &mut L) -> Option<EventId> {
        let head = self.head?;
        self.head = links.next(head);
        if self.head.is_none() {
            self.tail = None;
        }
        links.set_next(head, None);
        self.len -= 1;
        Some(head)
    }

    /// Inserts `node` right after `pred`, or at the head when `pred` is `None`
    pub fn insert_after<L: Links + ?Sized>(
        &mut self,
        links: &mut L,
        pred: Option<EventId>,
        node: EventId,
    ) {
        let Some(pred) = pred else {
            self.push_front(links, node);
            return;
        };
        let after = links.next(pred);
        links.set_next(node, after);
        links.set_next(pred, Some(node));
        if self.tail == Some(pred) {
            self.tail = Some(node);
        }
        self.len += 1;
    }

    /// Detaches the node following `pred` (the head when `pred` is `None`)
    pub fn remove_after<L: Links + ?Sized>(
        &mut self,
        links: &mut L,
        pred: Option<EventId>,
    ) -> Option<EventId> {
        let Some(pred) = pred else {
            return self.pop_front(links);
        };
        let node = links.next(pred)?;
        let after = links.next(node);
        links.set_next(pred, after);
        if self.tail == Some(node) {
            self.tail = Some(pred);
        }
        links.set_next(node, None);
        self.len -= 1;
        Some(node)
    }

    /// Finds the predecessor of `node`
    ///
    /// Returns `Some(None)` when `node` is the head and `None` when it is
    /// not in this queue.
    pub fn predecessor<L: Links + ?Sized>(&self, links: &L, node: EventId) -> Option<Option<EventId>> {
        let mut prev = None;
        let mut cur = self.head;
        while let Some(id) = cur {
            if id == node {
                return Some(prev);
            }
            prev = Some(id);
            cur = links.next(id);
        }
        None
    }

    /// Removes `node` wherever it sits; returns false if it is not here
    pub fn remove<L: Links + ?Sized>(&mut self, links: &mut L, node: EventId) -> bool {
        match self.predecessor(links, node) {
            Some(pred) => self.remove_after(links, pred).is_some(),
            None => false,
        }
    }

    /// Inserts `node` before the first element for which `goes_before`
    /// holds, or at the tail if none does
    pub fn insert_before_first<L, F>(&mut self, links: &mut L, node: EventId, mut goes_before: F)
    where
        L: Links + ?Sized,
        F: FnMut(&L, EventId) -> bool,
    {
        let mut prev = None;
        let mut cur = self.head;
        while let Some(id) = cur {
            if goes_before(&*links, id) {
                break;
            }
            prev = Some(id);
            cur = links.next(id);
        }
        self.insert_after(links, prev, node);
    }

    pub fn contains<L: Links + ?Sized>(&self, links: &L, node: EventId) -> bool {
        self.predecessor(links, node).is_some()
    }

    /// Iterates head to tail
    pub fn iter<'a, L: Links + ?Sized>(&self, links: &'a L) -> QueueIter<'a, L> {
        QueueIter {
            links,
            cur: self.head,
        }
    }
}

/// Head-to-tail iterator over a [`Queue`]
pub struct QueueIter<'a, L: ?Sized> {
    links: &'a L,
    cur: Option<EventId>,
}

impl<L: Links + ?Sized> Iterator for QueueIter<'_, L> {
    type Item = EventId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        self.cur = self.links.next(id);
        Some(id)
    }
}
