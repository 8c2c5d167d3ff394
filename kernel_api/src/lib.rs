//! # Kernel API
//!
//! This crate defines the vocabulary shared by the event loop, the task
//! engine, and the synchronization primitives.
//!
//! ## Philosophy
//!
//! The kernel provides **mechanisms**, not policies:
//! - Events are posted, never polled
//! - Time is read from an explicit platform, never ambient
//! - Waiting is expressed by parking an event in a queue
//! - Every scheduler instance is passed explicitly (no global default loop)
//!
//! ## Design Goals
//!
//! 1. **No allocation**: Handles are small `Copy` indices; queue links live
//!    in the event loop's fixed table
//! 2. **Explicit membership**: Every event is in exactly one queue or none,
//!    tracked as [`Membership`] rather than pointer tricks
//! 3. **Typed outcomes**: Expected negative outcomes are [`KernelError`]
//!    values; contract violations panic
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Preemptive (a callback runs until it returns)
//! - Thread-safe (one logical thread of control, no locks)
//! - An async runtime (coroutines are explicit state machines)

pub mod error;
pub mod ids;
pub mod kernel;
pub mod priority;
pub mod queue;
pub mod time;

pub use error::KernelError;
pub use ids::{EventId, QueueId};
pub use kernel::{Fired, KernelApi, Membership, QueueOrder, WaitQueue};
pub use priority::{Priority, PriorityGroup};
pub use queue::{Links, Queue, QueueIter};
pub use time::{NextWake, Ticks};
