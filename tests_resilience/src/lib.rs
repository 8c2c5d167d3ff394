//! Resilience Test Utilities
//!
//! This crate provides shared utilities for cross-crate scenario tests.
//!
//! ## Test Philosophy
//!
//! - **Deterministic time**: every scenario runs on `SimPlatform`, so the
//!   same inputs produce the same dispatch order
//! - **Host-shaped driving**: [`drive_until`] behaves like an embedding host
//!   loop, sleeping through idle periods until the next due timer
//! - **Invariants over traces**: tests check accounting (semaphore counts,
//!   slab blocks, frame depth) at every step, not only at the end

use event_loop::{EventLoop, EventLoopConfig, SimPlatform};
use kernel_api::NextWake;

/// Event table size used by every scenario
pub const TABLE_SIZE: usize = 64;

/// Event loop type shared by the scenarios
pub type TestLoop<W> = EventLoop<W, SimPlatform, TABLE_SIZE>;

/// Bootstrap helper for tests
///
/// Creates a loop with the default dispatch budget and the audit trail
/// enabled.
pub fn test_bootstrap<W>() -> TestLoop<W> {
    let config = EventLoopConfig {
        audit_capacity: 1024,
        ..EventLoopConfig::default()
    };
    EventLoop::with_config(SimPlatform::new(), config)
}

/// Runs the loop like a host would until the clock reaches `end`
///
/// Schedules again immediately while work is ready, jumps the clock to the
/// next due timer while idle, and stops once nothing is due before `end`.
/// Returns the number of `schedule()` passes.
pub fn drive_until<W>(el: &mut TestLoop<W>, world: &mut W, end: u64) -> usize {
    let mut passes = 0;
    loop {
        passes += 1;
        let now = el.platform().current_ticks();
        match el.schedule(world) {
            NextWake::Now => {}
            NextWake::At(due) if due.get() <= end => {
                el.platform_mut().set_ticks(due.get().max(now));
            }
            NextWake::At(_) | NextWake::Never => {
                if now < end {
                    el.platform_mut().set_ticks(end);
                }
                return passes;
            }
        }
    }
}

/// Sets the clock to `tick` and drains all ready work
pub fn run_at<W>(el: &mut TestLoop<W>, world: &mut W, tick: u64) -> NextWake {
    el.platform_mut().set_ticks(tick);
    el.run_until_idle(world)
}

/// Exports the audit trail as JSON lines, for failure diagnostics
pub fn audit_json<W>(el: &TestLoop<W>) -> Vec<String> {
    el.audit_log()
        .get_events()
        .filter_map(|record| serde_json::to_string(record).ok())
        .collect()
}
