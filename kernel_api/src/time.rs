//! Time abstractions

use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// A point on the platform's monotonic tick counter
///
/// Ticks are opaque: the platform's `TimerDevice` converts them to and
/// from microseconds. The same type doubles as a tick delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Ticks(u64);

impl Ticks {
    pub const ZERO: Ticks = Ticks(0);

    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the ticks remaining until `self`, zero if already passed
    pub fn saturating_since(self, earlier: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(earlier.0))
    }
}

impl Add for Ticks {
    type Output = Ticks;

    fn add(self, other: Ticks) -> Self::Output {
        Ticks(self.0.saturating_add(other.0))
    }
}

impl Sub for Ticks {
    type Output = Ticks;

    fn sub(self, other: Ticks) -> Self::Output {
        Ticks(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Ticks {
    fn from(ticks: u64) -> Self {
        Ticks(ticks)
    }
}

/// What a host should do after a `schedule()` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextWake {
    /// Ready work remains: call `schedule()` again right away
    Now,
    /// Nothing ready; the earliest timer is due at this tick
    At(Ticks),
    /// Nothing pending at all
    Never,
}

impl NextWake {
    /// Returns how long a host may sleep, measured from `now`
    ///
    /// `None` means sleep until woken externally.
    pub fn timeout_from(self, now: Ticks) -> Option<Ticks> {
        match self {
            NextWake::Now => Some(Ticks::ZERO),
            NextWake::At(due) => Some(due.saturating_since(now)),
            NextWake::Never => None,
        }
    }
}
