//! Slab allocator
//!
//! Carves a caller-supplied buffer into equal blocks. Free blocks form an
//! intrusive list: the first four bytes of a free block hold the index of
//! the next free block. Allocation and free are O(1).
//!
//! Waiters park an event in the slab's notify queue. A freed block goes
//! straight to the oldest waiter (attached to its event, then the event is
//! posted) instead of back to the free list; the woken callback collects it
//! with [`Slab::granted`].
//!
//! `used_blocks + free_blocks == total_blocks` holds at all times. Blocks
//! handed to a waiter count as used from the moment they are granted.

use core::mem;
use kernel_api::{EventId, KernelApi, KernelError, Membership, QueueOrder, WaitQueue};
use serde::{Deserialize, Serialize};

const LINK_BYTES: usize = mem::size_of::<u32>();
const END_OF_LIST: u32 = u32::MAX;

/// An allocated block
///
/// Owning a `Block` is the right to use its bytes. It is neither `Copy` nor
/// `Clone`, and goes back to the pool with [`Slab::free`].
#[derive(Debug, PartialEq, Eq)]
pub struct Block(u32);

impl Block {
    /// Position of the block inside its slab
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Point-in-time accounting of a slab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabStats {
    pub block_size: usize,
    pub total_blocks: usize,
    pub used_blocks: usize,
    pub free_blocks: usize,
    pub waiters: usize,
}

/// Fixed-block pool over a borrowed buffer
#[derive(Debug)]
pub struct Slab<'a> {
    memory: &'a mut [u8],
    /// Bytes skipped at the start of `memory` to align block 0
    offset: usize,
    block_size: usize,
    total: u32,
    used: u32,
    free_head: u32,
    notify_q: WaitQueue,
}

impl<'a> Slab<'a> {
    /// Partitions `memory` into blocks of at least `block_size` bytes
    ///
    /// The block size is rounded up to pointer alignment (and to at least
    /// four bytes for the free-list link).
    pub fn create<K: KernelApi + ?Sized>(
        kernel: &mut K,
        memory: &'a mut [u8],
        block_size: usize,
    ) -> Result<Self, KernelError> {
        Self::create_with_order(kernel, memory, block_size, QueueOrder::Fifo)
    }

    /// Like [`create`](Self::create), serving waiters in `order`
    pub fn create_with_order<K: KernelApi + ?Sized>(
        kernel: &mut K,
        memory: &'a mut [u8],
        block_size: usize,
        order: QueueOrder,
    ) -> Result<Self, KernelError> {
        if block_size == 0 {
            return Err(KernelError::InvalidBlockSize(block_size));
        }
        let align = mem::align_of::<usize>();
        let aligned = block_size
            .max(LINK_BYTES)
            .checked_next_multiple_of(align)
            .ok_or(KernelError::InvalidBlockSize(block_size))?;

        let len = memory.len();
        let offset = memory.as_ptr().align_offset(align).min(len);
        let total = ((len - offset) / aligned).min(END_OF_LIST as usize) as u32;
        if total == 0 {
            return Err(KernelError::BufferTooSmall {
                len,
                block_size: aligned,
            });
        }

        let mut slab = Self {
            memory,
            offset,
            block_size: aligned,
            total,
            used: 0,
            free_head: 0,
            notify_q: kernel.wait_queue(order),
        };
        for index in 0..total {
            let next = if index + 1 < total { index + 1 } else { END_OF_LIST };
            slab.write_link(index, next);
        }
        Ok(slab)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn total_blocks(&self) -> usize {
        self.total as usize
    }

    pub fn used_blocks(&self) -> usize {
        self.used as usize
    }

    pub fn free_blocks(&self) -> usize {
        (self.total - self.used) as usize
    }

    pub fn waiters(&self) -> usize {
        self.notify_q.len()
    }

    pub fn stats(&self) -> SlabStats {
        SlabStats {
            block_size: self.block_size,
            total_blocks: self.total_blocks(),
            used_blocks: self.used_blocks(),
            free_blocks: self.free_blocks(),
            waiters: self.waiters(),
        }
    }

    /// Takes a free block, or `None` when the pool is exhausted
    pub fn alloc(&mut self) -> Option<Block> {
        let index = self.pop_free()?;
        self.used += 1;
        Some(Block(index))
    }

    /// Returns `block` to the pool
    ///
    /// If a waiter is parked the block is granted to it directly.
    ///
    /// # Panics
    ///
    /// Panics if `block` does not belong to this slab.
    pub fn free<K: KernelApi + ?Sized>(&mut self, kernel: &mut K, block: Block) {
        assert!(
            block.0 < self.total,
            "block {} does not belong to this slab",
            block.0
        );
        match kernel.dequeue(&mut self.notify_q) {
            Some(waiter) => grant(kernel, waiter, block.0),
            None => {
                self.push_free(block.0);
                self.used -= 1;
            }
        }
    }

    /// Asks for a block through `waiter`
    ///
    /// If a block is free it is granted at once and `waiter` is posted;
    /// otherwise `waiter` is parked until a block is freed. Fails with
    /// [`KernelError::AlreadyQueued`] if `waiter` is queued anywhere.
    pub fn wait<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: EventId,
    ) -> Result<(), KernelError> {
        if kernel.is_queued(waiter) {
            return Err(KernelError::AlreadyQueued);
        }
        match self.pop_free() {
            Some(index) => {
                self.used += 1;
                grant(kernel, waiter, index);
                Ok(())
            }
            None => kernel.enqueue(&mut self.notify_q, waiter),
        }
    }

    /// Withdraws a waiter
    ///
    /// A parked waiter is simply removed. A waiter that was already granted
    /// a block but not yet dispatched is cancelled and its block freed
    /// (which may grant it to the next waiter). If the block was already
    /// collected with [`granted`](Self::granted), the event is still
    /// cancelled but the block stays with the caller.
    pub fn wait_cancel<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        waiter: EventId,
    ) -> Result<(), KernelError> {
        match kernel.membership(waiter) {
            Membership::Ready(_) => {
                kernel.cancel(waiter)?;
                if let Some(index) = kernel.take_attachment(waiter) {
                    self.free(kernel, Block(index as u32));
                }
                Ok(())
            }
            _ => kernel.withdraw(&mut self.notify_q, waiter),
        }
    }

    /// Collects the block granted to a woken waiter
    ///
    /// Call from the waiter's callback. Returns `None` if nothing was
    /// granted to `waiter`.
    pub fn granted<K: KernelApi + ?Sized>(&self, kernel: &mut K, waiter: EventId) -> Option<Block> {
        let index = kernel.take_attachment(waiter)?;
        debug_assert!(index < self.total as usize);
        Some(Block(index as u32))
    }

    pub fn block(&self, block: &Block) -> &[u8] {
        let start = self.block_start(block.0);
        &self.memory[start..start + self.block_size]
    }

    pub fn block_mut(&mut self, block: &Block) -> &mut [u8] {
        let start = self.block_start(block.0);
        &mut self.memory[start..start + self.block_size]
    }

    fn pop_free(&mut self) -> Option<u32> {
        if self.free_head == END_OF_LIST {
            return None;
        }
        let index = self.free_head;
        self.free_head = self.read_link(index);
        Some(index)
    }

    fn push_free(&mut self, index: u32) {
        self.write_link(index, self.free_head);
        self.free_head = index;
    }

    fn block_start(&self, index: u32) -> usize {
        assert!(index < self.total, "block {index} does not belong to this slab");
        self.offset + index as usize * self.block_size
    }

    fn read_link(&self, index: u32) -> u32 {
        let start = self.block_start(index);
        let mut bytes = [0u8; LINK_BYTES];
        bytes.copy_from_slice(&self.memory[start..start + LINK_BYTES]);
        u32::from_ne_bytes(bytes)
    }

    fn write_link(&mut self, index: u32, next: u32) {
        let start = self.block_start(index);
        self.memory[start..start + LINK_BYTES].copy_from_slice(&next.to_ne_bytes());
    }
}

fn grant<K: KernelApi + ?Sized>(kernel: &mut K, waiter: EventId, index: u32) {
    kernel.attach(waiter, index as usize);
    // Waiters are detached when granted
    let _ = kernel.post(waiter);
}
