//! # Resources
//!
//! Synchronization primitives built on the event loop's wait queues.
//!
//! ## Philosophy
//!
//! - **Waiting is an event, not a thread**: a caller that cannot get a
//!   resource parks an event and is posted when the resource is granted
//! - **Non-blocking by default**: without a wait event, an unavailable
//!   resource is an ordinary `Err(WouldBlock)` / `None`
//! - **No allocation**: the slab carves a caller-supplied buffer; queue
//!   links live in the kernel's event table
//! - **Accounting is deterministic and testable**
//!
//! ## Primitives
//!
//! - [`Semaphore`]: counting semaphore bounded by a limit, with waiters on
//!   both the take and the give side
//! - [`Slab`]: fixed-size block pool that hands freed blocks straight to
//!   the oldest waiter
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Thread-safe (the kernel is single-threaded)
//! - A general-purpose allocator (one block size per slab)

pub mod semaphore;
pub mod slab;

pub use semaphore::Semaphore;
pub use slab::{Block, Slab, SlabStats};
