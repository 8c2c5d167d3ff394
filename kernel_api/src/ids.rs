//! Handle types

use core::fmt;
use serde::{Deserialize, Serialize};

/// Handle to a slot in an event loop's event table
///
/// Handles are plain indices: they are only meaningful for the loop that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u16);

impl EventId {
    /// Creates a handle from a table index
    ///
    /// # Panics
    ///
    /// Panics if the index does not fit the handle width.
    pub fn from_index(index: usize) -> Self {
        assert!(index <= u16::MAX as usize, "event index {} out of range", index);
        Self(index as u16)
    }

    /// Returns the table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev#{}", self.0)
    }
}

/// Identity of a waiter queue
///
/// Issued by the event loop so an event's [`Membership`](crate::Membership)
/// can name the queue it is parked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueId(u32);

impl QueueId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}
