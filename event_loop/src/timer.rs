//! Timer subsystem
//!
//! Timers are ordinary events that wait in a queue sorted by due tick
//! before entering the ready engine. Equal due ticks keep start order.
//! Each `schedule()` pass moves the expired prefix of the queue into the
//! ready queues, so timers fire in non-decreasing due order.

use crate::audit::ScheduleEvent;
use crate::EventLoop;
use hal::Platform;
use kernel_api::{EventId, KernelError, Membership, Ticks};

impl<W, P: Platform, const N: usize> EventLoop<W, P, N> {
    /// Starts a detached event as a timer due at `due`
    ///
    /// Fails with [`KernelError::AlreadyQueued`] if the event sits in any
    /// queue. Invokes the wake hook when this timer becomes the earliest
    /// deadline while nothing is ready.
    pub fn start_timer(&mut self, event: EventId, due: Ticks) -> Result<(), KernelError> {
        let slot = self.table.get_mut(event);
        if slot.membership != Membership::Detached {
            return Err(KernelError::AlreadyQueued);
        }
        slot.due = due;
        slot.membership = Membership::Timer;

        // Timers are usually started in non-decreasing order
        let after_tail = self
            .timers
            .tail()
            .map_or(true, |tail| self.table.due(tail) <= due);
        if after_tail {
            self.timers.push_back(&mut self.table, event);
        } else {
            self.timers
                .insert_before_first(&mut self.table, event, |t, id| t.due(id) > due);
        }
        self.record(ScheduleEvent::TimerStarted { event, due });

        if self.timers.head() == Some(event) {
            self.earliest = Some(due);
            if self.ready_map == 0 {
                self.request_wake();
            }
        }
        Ok(())
    }

    /// Stops a timer
    ///
    /// A timer that already fired but was not yet dispatched is cancelled
    /// from its ready queue. Fails with [`KernelError::NotQueued`] if the
    /// event is in neither the timer queue nor a ready queue.
    pub fn stop_timer(&mut self, event: EventId) -> Result<(), KernelError> {
        match self.table.get(event).membership {
            Membership::Ready(_) => self.cancel(event),
            Membership::Timer => {
                self.unlink_timer(event);
                self.record(ScheduleEvent::TimerStopped { event });
                Ok(())
            }
            Membership::Detached | Membership::Waiting(_) => Err(KernelError::NotQueued),
        }
    }

    /// Fires a timer now
    ///
    /// A pending timer moves straight to the ready engine with its due tick
    /// reset to zero; an already ready timer is left alone. Fails with
    /// [`KernelError::NotQueued`] if the event is in neither queue.
    pub fn trigger_timer(&mut self, event: EventId) -> Result<(), KernelError> {
        match self.table.get(event).membership {
            Membership::Ready(_) => Ok(()),
            Membership::Timer => {
                self.unlink_timer(event);
                self.table.get_mut(event).due = Ticks::ZERO;
                self.post(event)
            }
            Membership::Detached | Membership::Waiting(_) => Err(KernelError::NotQueued),
        }
    }

    /// Due tick recorded by the last `start_timer`
    pub fn timer_due(&self, event: EventId) -> Ticks {
        self.table.due(event)
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Number of timers waiting to expire
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Due tick of the earliest pending timer
    pub fn next_due(&self) -> Option<Ticks> {
        self.earliest
    }

    /// Moves every timer due at or before `now` into the ready engine
    pub(crate) fn expire_timers(&mut self, now: Ticks) {
        while let Some(head) = self.timers.head() {
            if self.table.due(head) > now {
                break;
            }
            self.timers.pop_front(&mut self.table);
            self.table.get_mut(head).membership = Membership::Detached;
            self.record(ScheduleEvent::TimerExpired { event: head });
            // Freshly detached, so this cannot fail
            let _ = self.post(head);
        }
        self.refresh_earliest();
    }

    fn unlink_timer(&mut self, event: EventId) {
        let removed = self.timers.remove(&mut self.table, event);
        debug_assert!(removed, "timer membership out of sync for {event}");
        self.table.get_mut(event).membership = Membership::Detached;
        self.refresh_earliest();
    }

    fn refresh_earliest(&mut self) {
        self.earliest = self.timers.head().map(|head| self.table.due(head));
    }
}
