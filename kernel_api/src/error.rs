//! Kernel error types

use thiserror::Error;

/// Expected negative outcomes of kernel operations
///
/// These are ordinary control flow: a caller that asked for an unavailable
/// resource, or tried to cancel something that is not pending, branches on
/// the error. Programming defects (unknown handles, frame-stack overflow)
/// are not represented here; they panic.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The event already sits in a queue (ready, timer, or waiter)
    #[error("event is already queued")]
    AlreadyQueued,

    /// The event is not in the queue the operation expects
    #[error("event is not queued here")]
    NotQueued,

    /// The resource is unavailable and no wait event was supplied
    #[error("resource unavailable")]
    WouldBlock,

    /// Every slot of the fixed event table is in use
    #[error("event table is full")]
    TableFull,

    /// The task is still running a coroutine
    #[error("task has not ended")]
    TaskBusy,

    /// Slab block size of zero
    #[error("invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// Slab buffer cannot hold a single aligned block
    #[error("buffer of {len} bytes cannot hold a {block_size}-byte block")]
    BufferTooSmall { len: usize, block_size: usize },
}
