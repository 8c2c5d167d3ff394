//! Fixed-capacity event table
//!
//! Every event the loop knows about is a slot in this table. The slot holds
//! the event's attributes, its membership, and the single `next` link that
//! threads it through whichever queue it is in. Vacant slots are chained
//! through the same link into a free list.

use crate::Callback;
use kernel_api::{EventId, Links, Membership, Priority, Ticks};

pub(crate) struct Slot<W, P, const N: usize> {
    pub(crate) live: bool,
    pub(crate) priority: Priority,
    pub(crate) callback: Option<Callback<W, P, N>>,
    pub(crate) context: usize,
    pub(crate) membership: Membership,
    pub(crate) next: Option<EventId>,
    pub(crate) due: Ticks,
    pub(crate) attachment: Option<usize>,
}

impl<W, P, const N: usize> Slot<W, P, N> {
    fn vacant(next: Option<EventId>) -> Self {
        Self {
            live: false,
            priority: Priority::default(),
            callback: None,
            context: 0,
            membership: Membership::Detached,
            next,
            due: Ticks::ZERO,
            attachment: None,
        }
    }
}

pub(crate) struct EventTable<W, P, const N: usize> {
    slots: [Slot<W, P, N>; N],
    free: Option<EventId>,
    live: usize,
}

impl<W, P, const N: usize> EventTable<W, P, N> {
    pub(crate) fn new() -> Self {
        assert!(
            N <= u16::MAX as usize + 1,
            "event table capacity {N} exceeds the EventId range"
        );
        let slots = core::array::from_fn(|i| {
            let next = (i + 1 < N).then(|| EventId::from_index(i + 1));
            Slot::vacant(next)
        });
        Self {
            slots,
            free: (N > 0).then(|| EventId::from_index(0)),
            live: 0,
        }
    }

    /// Claims a vacant slot; `None` when the table is full
    pub(crate) fn allocate(
        &mut self,
        priority: Priority,
        callback: Callback<W, P, N>,
        context: usize,
    ) -> Option<EventId> {
        let id = self.free?;
        let slot = &mut self.slots[id.index()];
        self.free = slot.next;
        *slot = Slot {
            live: true,
            priority,
            callback: Some(callback),
            context,
            membership: Membership::Detached,
            next: None,
            due: Ticks::ZERO,
            attachment: None,
        };
        self.live += 1;
        Some(id)
    }

    /// Returns a detached slot to the free list
    pub(crate) fn vacate(&mut self, id: EventId) {
        let free = self.free;
        *self.get_mut(id) = Slot::vacant(free);
        self.free = Some(id);
        self.live -= 1;
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// # Panics
    ///
    /// Panics if `id` does not name a registered event.
    pub(crate) fn get(&self, id: EventId) -> &Slot<W, P, N> {
        let slot = self
            .slots
            .get(id.index())
            .filter(|slot| slot.live)
            .unwrap_or_else(|| panic!("unknown event {id}"));
        slot
    }

    /// # Panics
    ///
    /// Panics if `id` does not name a registered event.
    pub(crate) fn get_mut(&mut self, id: EventId) -> &mut Slot<W, P, N> {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.live => slot,
            _ => panic!("unknown event {id}"),
        }
    }

    pub(crate) fn priority(&self, id: EventId) -> Priority {
        self.get(id).priority
    }

    pub(crate) fn due(&self, id: EventId) -> Ticks {
        self.get(id).due
    }
}

impl<W, P, const N: usize> Links for EventTable<W, P, N> {
    fn next(&self, node: EventId) -> Option<EventId> {
        self.get(node).next
    }

    fn set_next(&mut self, node: EventId, next: Option<EventId>) {
        self.get_mut(node).next = next;
    }
}
