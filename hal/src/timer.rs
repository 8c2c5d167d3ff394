//! # Timer Device
//!
//! The event loop's only source of time.
//!
//! Timer deadlines, `remaining_*` queries, and the host's sleep timeout are
//! all computed from [`TimerDevice::poll_ticks`]. The loop reads it once
//! per `schedule()` pass and once per timer start, never in a busy loop.
//!
//! A tick is whatever the platform counts: CPU cycles, a 1 kHz systick, or
//! nanoseconds from `CLOCK_MONOTONIC`. Code above this layer relates ticks
//! to real time only through the two conversion methods, so millisecond
//! timeouts keep their meaning when the tick rate changes.

/// Monotonic tick source
///
/// # Requirements
///
/// - `poll_ticks` never returns a smaller value than a previous call
/// - `poll_ticks` returns immediately
/// - the conversions round towards zero and agree with each other, so that
///   `ticks_to_micros(micros_to_ticks(us)) == us`
///
/// # Examples
///
/// ```
/// use hal::TimerDevice;
///
/// fn due_after_ms<T: TimerDevice>(clock: &mut T, ms: u64) -> u64 {
///     clock.poll_ticks() + clock.micros_to_ticks(ms * 1_000)
/// }
/// ```
pub trait TimerDevice {
    /// Current tick count
    fn poll_ticks(&mut self) -> u64;

    /// Converts a tick count into microseconds
    fn ticks_to_micros(&self, ticks: u64) -> u64;

    /// Converts microseconds into a tick count
    fn micros_to_ticks(&self, micros: u64) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 32 kHz low-power oscillator, a common sleep clock on MCUs
    struct LfClock {
        count: u64,
    }

    impl TimerDevice for LfClock {
        fn poll_ticks(&mut self) -> u64 {
            self.count
        }

        fn ticks_to_micros(&self, ticks: u64) -> u64 {
            ticks * 1_000_000 / 32_768
        }

        fn micros_to_ticks(&self, micros: u64) -> u64 {
            micros * 32_768 / 1_000_000
        }
    }

    fn due_after_ms<T: TimerDevice>(clock: &mut T, ms: u64) -> u64 {
        clock.poll_ticks() + clock.micros_to_ticks(ms * 1_000)
    }

    #[test]
    fn test_deadline_from_millis() {
        let mut clock = LfClock { count: 100 };
        assert_eq!(due_after_ms(&mut clock, 1_000), 100 + 32_768);
        assert_eq!(due_after_ms(&mut clock, 0), 100);
    }

    #[test]
    fn test_conversions_truncate() {
        let clock = LfClock { count: 0 };
        // One tick is about 30.5 microseconds
        assert_eq!(clock.ticks_to_micros(1), 30);
        assert_eq!(clock.micros_to_ticks(30), 0);
        assert_eq!(clock.ticks_to_micros(32_768), 1_000_000);
    }
}
