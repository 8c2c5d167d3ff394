//! Priority ready engine
//!
//! Four queues, one per coarse priority group, plus a bitmap of the
//! non-empty ones. Inside a queue events are ordered by descending priority
//! and by arrival among equals. Dispatch always takes the head of the
//! highest occupied group.

use crate::audit::ScheduleEvent;
use crate::EventLoop;
use hal::Platform;
use kernel_api::{EventId, Fired, KernelError, Membership, Priority, PriorityGroup};

impl<W, P: Platform, const N: usize> EventLoop<W, P, N> {
    /// Moves a detached event into the ready queue of its group
    ///
    /// Fails with [`KernelError::AlreadyQueued`] if the event sits in any
    /// queue. Invokes the wake hook when this is the first ready event.
    pub fn post(&mut self, event: EventId) -> Result<(), KernelError> {
        if self.table.get(event).membership != Membership::Detached {
            return Err(KernelError::AlreadyQueued);
        }

        let was_idle = self.ready_map == 0;
        let priority = self.push_ready(event);
        self.record(ScheduleEvent::Posted { event, priority });

        if was_idle {
            self.request_wake();
        }
        Ok(())
    }

    /// Removes a ready event before it is dispatched
    pub fn cancel(&mut self, event: EventId) -> Result<(), KernelError> {
        let Membership::Ready(group) = self.table.get(event).membership else {
            return Err(KernelError::NotQueued);
        };
        self.unlink_ready(group, event);
        self.record(ScheduleEvent::Cancelled { event });
        Ok(())
    }

    /// Changes the priority of a ready event and moves it to the matching
    /// position, behind any events of equal priority
    ///
    /// The event may change group.
    pub fn reset_priority(&mut self, event: EventId, priority: Priority) -> Result<(), KernelError> {
        let Membership::Ready(group) = self.table.get(event).membership else {
            return Err(KernelError::NotQueued);
        };
        self.unlink_ready(group, event);
        self.table.get_mut(event).priority = priority;
        self.push_ready(event);
        Ok(())
    }

    /// Priority of the event that would be dispatched next
    pub fn highest_ready_priority(&self) -> Option<Priority> {
        let group = self.highest_group()?;
        let head = self.ready[group.index()].head()?;
        Some(self.table.priority(head))
    }

    pub fn has_ready(&self) -> bool {
        self.ready_map != 0
    }

    /// Number of events waiting in the ready queues
    pub fn ready_count(&self) -> usize {
        self.ready.iter().map(|q| q.len()).sum()
    }

    /// Pops the next event to dispatch, leaving it detached
    pub(crate) fn pop_ready(&mut self) -> Option<Fired> {
        let group = self.highest_group()?;
        let queue = &mut self.ready[group.index()];
        let event = queue.pop_front(&mut self.table)?;
        if queue.is_empty() {
            self.ready_map &= !group_bit(group);
        }

        let slot = self.table.get_mut(event);
        slot.membership = Membership::Detached;
        Some(Fired {
            event,
            context: slot.context,
            priority: slot.priority,
        })
    }

    /// Links a detached event into its group queue and marks it ready
    fn push_ready(&mut self, event: EventId) -> Priority {
        let priority = self.table.priority(event);
        let group = priority.group();
        let queue = &mut self.ready[group.index()];

        let behind_tail = queue
            .tail()
            .map_or(true, |tail| priority <= self.table.priority(tail));
        if behind_tail {
            queue.push_back(&mut self.table, event);
        } else {
            queue.insert_before_first(&mut self.table, event, |t, id| t.priority(id) < priority);
        }

        self.table.get_mut(event).membership = Membership::Ready(group);
        self.ready_map |= group_bit(group);
        priority
    }

    fn unlink_ready(&mut self, group: PriorityGroup, event: EventId) {
        let queue = &mut self.ready[group.index()];
        let removed = queue.remove(&mut self.table, event);
        debug_assert!(removed, "ready membership out of sync for {event}");
        if queue.is_empty() {
            self.ready_map &= !group_bit(group);
        }
        self.table.get_mut(event).membership = Membership::Detached;
    }

    /// Highest occupied group: the most significant set bit of the bitmap
    fn highest_group(&self) -> Option<PriorityGroup> {
        if self.ready_map == 0 {
            return None;
        }
        let index = (u8::BITS - 1 - self.ready_map.leading_zeros()) as usize;
        Some(PriorityGroup::from_index(index))
    }
}

fn group_bit(group: PriorityGroup) -> u8 {
    1 << group.index()
}
