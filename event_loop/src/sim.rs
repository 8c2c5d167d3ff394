//! # Simulated Platform
//!
//! Deterministic clock and wake hook for tests.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! Time only moves when a test says so, and every wake request is counted,
//! so timer ordering and host-integration behaviour can be asserted
//! exactly.

use hal::{TimerDevice, WakeHook};

/// Simulated platform with controllable time progression
///
/// One tick is one microsecond unless a different rate is given.
///
/// # Examples
///
/// ```
/// use event_loop::SimPlatform;
/// use hal::TimerDevice;
///
/// let mut platform = SimPlatform::new();
/// assert_eq!(platform.poll_ticks(), 0);
///
/// platform.advance_ticks(100);
/// assert_eq!(platform.poll_ticks(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct SimPlatform {
    ticks: u64,
    ticks_per_micro: u64,
    wake_requests: u32,
}

impl SimPlatform {
    /// Creates a simulated platform starting at tick 0
    pub fn new() -> Self {
        Self {
            ticks: 0,
            ticks_per_micro: 1,
            wake_requests: 0,
        }
    }

    /// Creates a simulated platform starting at a specific tick count
    pub fn with_initial_ticks(ticks: u64) -> Self {
        Self {
            ticks,
            ..Self::new()
        }
    }

    /// Uses `ticks_per_micro` ticks for every microsecond
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_micro` is zero.
    pub fn with_ticks_per_micro(mut self, ticks_per_micro: u64) -> Self {
        assert!(ticks_per_micro > 0, "tick rate must be non-zero");
        self.ticks_per_micro = ticks_per_micro;
        self
    }

    /// Advances the clock by `delta` ticks
    ///
    /// # Panics
    ///
    /// Panics if advancing would overflow u64.
    pub fn advance_ticks(&mut self, delta: u64) {
        self.ticks = self.ticks.checked_add(delta).expect("timer tick overflow");
    }

    /// Sets the clock to a specific tick count
    ///
    /// # Panics
    ///
    /// Panics if `new_ticks` is behind the current count (would violate
    /// monotonicity).
    pub fn set_ticks(&mut self, new_ticks: u64) {
        assert!(
            new_ticks >= self.ticks,
            "Cannot set ticks backwards: {} < {}",
            new_ticks,
            self.ticks
        );
        self.ticks = new_ticks;
    }

    pub fn current_ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of `schedule_prepare` calls received so far
    pub fn wake_requests(&self) -> u32 {
        self.wake_requests
    }

    /// Resets the wake counter, returning its previous value
    pub fn take_wake_requests(&mut self) -> u32 {
        core::mem::take(&mut self.wake_requests)
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerDevice for SimPlatform {
    fn poll_ticks(&mut self) -> u64 {
        self.ticks
    }

    fn ticks_to_micros(&self, ticks: u64) -> u64 {
        ticks / self.ticks_per_micro
    }

    fn micros_to_ticks(&self, micros: u64) -> u64 {
        micros.saturating_mul(self.ticks_per_micro)
    }
}

impl WakeHook for SimPlatform {
    fn schedule_prepare(&mut self) {
        self.wake_requests += 1;
    }
}
