//! # Wake Hook
//!
//! Integration point for embedding the event loop in a foreign host loop.
//!
//! The event loop calls [`WakeHook::schedule_prepare`] exactly when its set
//! of pending work goes from empty to non-empty (an event became ready, or
//! a timer became the new earliest deadline while nothing was ready). The
//! host reacts by arranging a future call to `schedule()`: posting a
//! message to a GUI loop, signalling a completion port, re-arming a sleep.
//!
//! The hook is never invoked while a `schedule()` pass is already running.
//! Hosts must still tolerate a request that arrives when they were about
//! to schedule anyway.

/// Host loop notification
pub trait WakeHook {
    /// Asks the host to call `schedule()` soon
    fn schedule_prepare(&mut self);
}

/// Everything the event loop needs from the platform
pub trait Platform: crate::TimerDevice + WakeHook {}

impl<T: crate::TimerDevice + WakeHook> Platform for T {}
