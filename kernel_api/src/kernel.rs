//! Kernel API trait and waiter-queue types

use crate::{EventId, KernelError, Priority, PriorityGroup, Queue, QueueId, Ticks};
use serde::{Deserialize, Serialize};

/// Where an event currently lives
///
/// An event is in exactly one queue or in none. Every "is it already
/// enqueued?" check reads this instead of inspecting list pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    /// In no queue; free to be posted, started, or parked
    Detached,
    /// In the ready queue of this group, waiting for dispatch
    Ready(PriorityGroup),
    /// In the due-ordered timer queue
    Timer,
    /// Parked in a waiter queue owned by a primitive
    Waiting(QueueId),
}

/// Insertion discipline of a [`WaitQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueOrder {
    /// Oldest first
    Fifo,
    /// Newest first
    Lifo,
    /// Highest priority first, oldest first among equals
    Priority,
}

/// A queue of parked events owned by a primitive (semaphore, slab, task)
///
/// Created by [`KernelApi::wait_queue`]; the links of its members live in
/// the issuing kernel's event table, so a `WaitQueue` must only be used
/// with the kernel that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitQueue {
    id: QueueId,
    order: QueueOrder,
    list: Queue,
}

impl WaitQueue {
    /// Builds an empty waiter queue; kernels call this from `wait_queue`
    pub fn new(id: QueueId, order: QueueOrder) -> Self {
        Self {
            id,
            order,
            list: Queue::new(),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn order(&self) -> QueueOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Read access to the underlying list
    pub fn list(&self) -> &Queue {
        &self.list
    }

    /// Mutable access to the underlying list (kernel implementations only)
    pub fn list_mut(&mut self) -> &mut Queue {
        &mut self.list
    }
}

/// What a dispatched callback receives about the event that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub event: EventId,
    pub context: usize,
    pub priority: Priority,
}

/// The kernel API trait
///
/// This is the interface the task engine and the synchronization
/// primitives are written against. The event loop implements it; tests may
/// wrap it.
///
/// # Design Principles
///
/// **Explicit instance**: every operation takes the kernel by reference,
/// there is no global default loop.
///
/// **Membership is exclusive**: operations that enqueue an event fail with
/// [`KernelError::AlreadyQueued`] unless it is [`Membership::Detached`].
///
/// **Unknown handles are defects**: passing an `EventId` the kernel never
/// issued (or already released) panics.
pub trait KernelApi {
    /// Reads the platform clock
    fn now(&mut self) -> Ticks;

    /// Converts microseconds into platform ticks
    fn micros_to_ticks(&self, micros: u64) -> Ticks;

    /// Converts platform ticks into microseconds
    fn ticks_to_micros(&self, ticks: Ticks) -> u64;

    /// Moves a detached event into its group's ready queue
    fn post(&mut self, event: EventId) -> Result<(), KernelError>;

    /// Removes a ready, not yet dispatched event
    fn cancel(&mut self, event: EventId) -> Result<(), KernelError>;

    fn membership(&self, event: EventId) -> Membership;

    fn is_ready(&self, event: EventId) -> bool {
        matches!(self.membership(event), Membership::Ready(_))
    }

    fn is_queued(&self, event: EventId) -> bool {
        self.membership(event) != Membership::Detached
    }

    fn priority(&self, event: EventId) -> Priority;

    /// Registers a new event sharing `parent`'s callback, context and priority
    fn inherit(&mut self, parent: EventId) -> Result<EventId, KernelError>;

    /// Returns a detached event's slot to the table
    fn release(&mut self, event: EventId) -> Result<(), KernelError>;

    /// Starts a detached event as a timer due at an absolute tick
    fn start_timer(&mut self, event: EventId, due: Ticks) -> Result<(), KernelError>;

    /// Stops a timer whether it is still pending or already fired and ready
    fn stop_timer(&mut self, event: EventId) -> Result<(), KernelError>;

    /// Fires a timer immediately
    fn trigger_timer(&mut self, event: EventId) -> Result<(), KernelError>;

    /// Due tick recorded by the last `start_timer`
    fn timer_due(&self, event: EventId) -> Ticks;

    fn start_timer_after(&mut self, event: EventId, delay: Ticks) -> Result<(), KernelError> {
        let due = self.now() + delay;
        self.start_timer(event, due)
    }

    fn start_timer_us(&mut self, event: EventId, micros: u64) -> Result<(), KernelError> {
        let delay = self.micros_to_ticks(micros);
        self.start_timer_after(event, delay)
    }

    fn start_timer_ms(&mut self, event: EventId, millis: u64) -> Result<(), KernelError> {
        self.start_timer_us(event, millis.saturating_mul(1_000))
    }

    /// Ticks left before a pending timer fires; zero once it is no longer
    /// in the timer queue or its due time has passed
    fn remaining_ticks(&mut self, event: EventId) -> Ticks {
        if self.membership(event) != Membership::Timer {
            return Ticks::ZERO;
        }
        let due = self.timer_due(event);
        due.saturating_since(self.now())
    }

    fn remaining_us(&mut self, event: EventId) -> u64 {
        let remaining = self.remaining_ticks(event);
        self.ticks_to_micros(remaining)
    }

    fn remaining_ms(&mut self, event: EventId) -> u64 {
        self.remaining_us(event) / 1_000
    }

    /// Creates an empty waiter queue bound to this kernel
    fn wait_queue(&mut self, order: QueueOrder) -> WaitQueue;

    /// Parks a detached event in `queue`
    fn enqueue(&mut self, queue: &mut WaitQueue, event: EventId) -> Result<(), KernelError>;

    /// Unparks the first event of `queue`, leaving it detached
    fn dequeue(&mut self, queue: &mut WaitQueue) -> Option<EventId>;

    /// Unparks `event` from `queue`
    fn withdraw(&mut self, queue: &mut WaitQueue, event: EventId) -> Result<(), KernelError>;

    /// Stores a word on the event for whoever handles it next
    fn attach(&mut self, event: EventId, value: usize);

    fn attachment(&self, event: EventId) -> Option<usize>;

    fn take_attachment(&mut self, event: EventId) -> Option<usize>;
}
