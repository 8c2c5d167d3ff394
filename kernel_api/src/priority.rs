//! Event priorities
//!
//! A priority is one byte. The top two bits pick one of four coarse
//! groups; the ready engine keeps one queue per group and always serves
//! the numerically highest occupied group first. Inside a group, events
//! are ordered by the full byte (so effectively by the low six bits),
//! first-in-first-out among equals.

use core::fmt;
use serde::{Deserialize, Serialize};

const GROUP_SHIFT: u8 = 6;
const SUB_PRIORITY_MASK: u8 = 0x3F;

/// Coarse priority group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityGroup {
    Lower = 0,
    Middle = 1,
    High = 2,
    Highest = 3,
}

impl PriorityGroup {
    /// Number of groups, and of ready queues
    pub const COUNT: usize = 4;

    /// All groups, lowest first
    pub const ALL: [PriorityGroup; 4] = [
        PriorityGroup::Lower,
        PriorityGroup::Middle,
        PriorityGroup::High,
        PriorityGroup::Highest,
    ];

    /// Returns the ready-queue index (and ready-bitmap bit) of this group
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the group at a ready-queue index
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }
}

/// Event priority byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(u8);

impl Priority {
    /// Base of the lowest group
    pub const LOWER: Priority = Priority(0x00);
    /// Base of the middle group
    pub const MIDDLE: Priority = Priority(0x40);
    /// Base of the high group
    pub const HIGH: Priority = Priority(0x80);
    /// Base of the highest group
    pub const HIGHEST: Priority = Priority(0xC0);

    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Builds a priority from a group and a sub-priority (low six bits kept)
    pub const fn in_group(group: PriorityGroup, sub: u8) -> Self {
        Self(((group as u8) << GROUP_SHIFT) | (sub & SUB_PRIORITY_MASK))
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn group(self) -> PriorityGroup {
        PriorityGroup::from_index((self.0 >> GROUP_SHIFT) as usize)
    }

    pub const fn sub_priority(self) -> u8 {
        self.0 & SUB_PRIORITY_MASK
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOWER
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}+{}", self.group(), self.sub_priority())
    }
}
