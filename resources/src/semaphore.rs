//! Counting semaphore
//!
//! `0 <= count <= limit` always holds. Takers wait while the count is zero,
//! givers wait while it is at the limit, so at most one of the two waiter
//! queues is non-empty at a time. A take that meets a waiting giver wakes
//! the giver instead of touching the count (and symmetrically for give).

use kernel_api::{EventId, KernelApi, KernelError, Membership, QueueOrder, WaitQueue};

/// Counting semaphore with event-based waiters
#[derive(Debug)]
pub struct Semaphore {
    count: u32,
    limit: u32,
    take_q: WaitQueue,
    give_q: WaitQueue,
}

impl Semaphore {
    /// Creates a semaphore holding `count` of at most `limit` units, with
    /// waiters served oldest first
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero or `count > limit`.
    pub fn new<K: KernelApi + ?Sized>(kernel: &mut K, count: u32, limit: u32) -> Self {
        Self::with_order(kernel, count, limit, QueueOrder::Fifo)
    }

    /// Creates a semaphore whose waiters are served in `order`
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero or `count > limit`.
    pub fn with_order<K: KernelApi + ?Sized>(
        kernel: &mut K,
        count: u32,
        limit: u32,
        order: QueueOrder,
    ) -> Self {
        assert!(limit > 0, "semaphore limit must be non-zero");
        assert!(
            count <= limit,
            "semaphore count {} exceeds limit {}",
            count,
            limit
        );
        Self {
            count,
            limit,
            take_q: kernel.wait_queue(order),
            give_q: kernel.wait_queue(order),
        }
    }

    /// Creates a binary semaphore (limit 1)
    pub fn binary<K: KernelApi + ?Sized>(kernel: &mut K, available: bool) -> Self {
        Self::new(kernel, u32::from(available), 1)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn take_waiters(&self) -> usize {
        self.take_q.len()
    }

    pub fn give_waiters(&self) -> usize {
        self.give_q.len()
    }

    /// Takes one unit
    ///
    /// If a unit is available it is taken now and `waiter`, if any, is
    /// posted. Otherwise `waiter` is parked until a give grants it, or the
    /// call fails with [`KernelError::WouldBlock`] when there is no waiter.
    pub fn take<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: Option<EventId>,
    ) -> Result<(), KernelError> {
        check_detached(kernel, waiter)?;

        if self.count == 0 {
            return match waiter {
                Some(event) => kernel.enqueue(&mut self.take_q, event),
                None => Err(KernelError::WouldBlock),
            };
        }

        match kernel.dequeue(&mut self.give_q) {
            Some(giver) => kernel.post(giver)?,
            None => self.count -= 1,
        }
        if let Some(event) = waiter {
            kernel.post(event)?;
        }
        Ok(())
    }

    /// Gives one unit back; the mirror image of [`take`](Self::take)
    /// against the limit
    pub fn give<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: Option<EventId>,
    ) -> Result<(), KernelError> {
        check_detached(kernel, waiter)?;

        if self.count == self.limit {
            return match waiter {
                Some(event) => kernel.enqueue(&mut self.give_q, event),
                None => Err(KernelError::WouldBlock),
            };
        }

        match kernel.dequeue(&mut self.take_q) {
            Some(taker) => kernel.post(taker)?,
            None => self.count += 1,
        }
        if let Some(event) = waiter {
            kernel.post(event)?;
        }
        Ok(())
    }

    /// Withdraws a take waiter
    ///
    /// A waiter that was already granted (ready, not yet dispatched) is
    /// cancelled and its unit given back when the count has room.
    pub fn take_cancel<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: EventId,
    ) -> Result<(), KernelError> {
        match kernel.membership(waiter) {
            Membership::Ready(_) => {
                kernel.cancel(waiter)?;
                let _ = self.give(kernel, None);
                Ok(())
            }
            _ => kernel.withdraw(&mut self.take_q, waiter),
        }
    }

    /// Withdraws a give waiter
    ///
    /// A waiter that was already granted is cancelled and its unit taken
    /// back when the count is non-zero.
    pub fn give_cancel<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: EventId,
    ) -> Result<(), KernelError> {
        match kernel.membership(waiter) {
            Membership::Ready(_) => {
                kernel.cancel(waiter)?;
                let _ = self.take(kernel, None);
                Ok(())
            }
            _ => kernel.withdraw(&mut self.give_q, waiter),
        }
    }
}

fn check_detached<K: KernelApi + ?Sized>(
    kernel: &K,
    waiter: Option<EventId>,
) -> Result<(), KernelError> {
    match waiter {
        Some(event) if kernel.is_queued(event) => Err(KernelError::AlreadyQueued),
        _ => Ok(()),
    }
}
