//! `KernelApi` implementation
//!
//! Everything tasks and primitives need from the loop: posting, timers,
//! waiter queues, and the per-event attachment word.

use crate::EventLoop;
use hal::Platform;
use kernel_api::{
    EventId, KernelApi, KernelError, Membership, Priority, QueueId, QueueOrder, Ticks, WaitQueue,
};

impl<W, P: Platform, const N: usize> KernelApi for EventLoop<W, P, N> {
    fn now(&mut self) -> Ticks {
        self.read_clock()
    }

    fn micros_to_ticks(&self, micros: u64) -> Ticks {
        Ticks::new(self.platform.micros_to_ticks(micros))
    }

    fn ticks_to_micros(&self, ticks: Ticks) -> u64 {
        self.platform.ticks_to_micros(ticks.get())
    }

    fn post(&mut self, event: EventId) -> Result<(), KernelError> {
        EventLoop::post(self, event)
    }

    fn cancel(&mut self, event: EventId) -> Result<(), KernelError> {
        EventLoop::cancel(self, event)
    }

    fn membership(&self, event: EventId) -> Membership {
        self.table.get(event).membership
    }

    fn priority(&self, event: EventId) -> Priority {
        self.table.priority(event)
    }

    fn inherit(&mut self, parent: EventId) -> Result<EventId, KernelError> {
        let slot = self.table.get(parent);
        let (priority, callback, context) = (slot.priority, slot.callback, slot.context);
        let callback = callback.unwrap_or_else(|| panic!("unknown event {parent}"));
        self.register(priority, callback, context)
    }

    fn release(&mut self, event: EventId) -> Result<(), KernelError> {
        if self.table.get(event).membership != Membership::Detached {
            return Err(KernelError::AlreadyQueued);
        }
        self.table.vacate(event);
        Ok(())
    }

    fn start_timer(&mut self, event: EventId, due: Ticks) -> Result<(), KernelError> {
        EventLoop::start_timer(self, event, due)
    }

    fn stop_timer(&mut self, event: EventId) -> Result<(), KernelError> {
        EventLoop::stop_timer(self, event)
    }

    fn trigger_timer(&mut self, event: EventId) -> Result<(), KernelError> {
        EventLoop::trigger_timer(self, event)
    }

    fn timer_due(&self, event: EventId) -> Ticks {
        EventLoop::timer_due(self, event)
    }

    fn wait_queue(&mut self, order: QueueOrder) -> WaitQueue {
        let id = QueueId::new(self.next_queue_id);
        self.next_queue_id = self.next_queue_id.wrapping_add(1);
        WaitQueue::new(id, order)
    }

    fn enqueue(&mut self, queue: &mut WaitQueue, event: EventId) -> Result<(), KernelError> {
        if self.table.get(event).membership != Membership::Detached {
            return Err(KernelError::AlreadyQueued);
        }

        let order = queue.order();
        let list = queue.list_mut();
        match order {
            QueueOrder::Fifo => list.push_back(&mut self.table, event),
            QueueOrder::Lifo => list.push_front(&mut self.table, event),
            QueueOrder::Priority => {
                let priority = self.table.priority(event);
                list.insert_before_first(&mut self.table, event, |t, id| t.priority(id) < priority);
            }
        }
        self.table.get_mut(event).membership = Membership::Waiting(queue.id());
        Ok(())
    }

    fn dequeue(&mut self, queue: &mut WaitQueue) -> Option<EventId> {
        let event = queue.list_mut().pop_front(&mut self.table)?;
        self.table.get_mut(event).membership = Membership::Detached;
        Some(event)
    }

    fn withdraw(&mut self, queue: &mut WaitQueue, event: EventId) -> Result<(), KernelError> {
        if self.table.get(event).membership != Membership::Waiting(queue.id()) {
            return Err(KernelError::NotQueued);
        }
        let removed = queue.list_mut().remove(&mut self.table, event);
        debug_assert!(removed, "waiter membership out of sync for {event}");
        self.table.get_mut(event).membership = Membership::Detached;
        Ok(())
    }

    fn attach(&mut self, event: EventId, value: usize) {
        self.table.get_mut(event).attachment = Some(value);
    }

    fn attachment(&self, event: EventId) -> Option<usize> {
        self.table.get(event).attachment
    }

    fn take_attachment(&mut self, event: EventId) -> Option<usize> {
        self.table.get_mut(event).attachment.take()
    }
}
