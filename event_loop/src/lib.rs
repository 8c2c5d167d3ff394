//! # Event Loop
//!
//! This crate provides the priority event loop: a fixed event table, the
//! four-group ready engine, the due-ordered timer queue, and the single
//! `schedule()` entry point that drives them.
//!
//! ## Philosophy
//!
//! **One thread of control, no hidden work.**
//!
//! Nothing runs unless the host calls [`EventLoop::schedule`]. A pass
//! promotes expired timers, dispatches a bounded number of ready events
//! (highest group first, FIFO among equal priorities), and tells the host
//! when it needs to be called again. Callbacks run to completion; there is
//! no preemption and no locking.
//!
//! ## Ownership
//!
//! The loop owns every event's links and attributes. Callers hold
//! [`EventId`] handles. The application's own state (the "world") is owned
//! by the caller and lent to each `schedule()` pass, so callbacks receive
//! both the loop and the world explicitly:
//!
//! ```
//! use event_loop::{EventLoop, SimPlatform};
//! use kernel_api::{Fired, KernelApi, NextWake, Priority, Ticks};
//!
//! #[derive(Default)]
//! struct World {
//!     blinks: u32,
//! }
//!
//! fn blink(el: &mut EventLoop<World, SimPlatform, 8>, world: &mut World, fired: Fired) {
//!     world.blinks += 1;
//!     el.start_timer_after(fired.event, Ticks::new(500)).unwrap();
//! }
//!
//! let mut el: EventLoop<World, SimPlatform, 8> = EventLoop::new(SimPlatform::new());
//! let mut world = World::default();
//! let led = el.register(Priority::MIDDLE, blink, 0).unwrap();
//! el.post(led).unwrap();
//!
//! assert_eq!(el.schedule(&mut world), NextWake::At(Ticks::new(500)));
//! el.platform_mut().advance_ticks(500);
//! el.schedule(&mut world);
//! assert_eq!(world.blinks, 2);
//! ```
//!
//! ## Simulation
//!
//! [`SimPlatform`] is a deterministic clock plus a counting wake hook, so
//! every ordering property can be tested under `cargo test`.

pub mod audit;
pub mod config;
mod kernel;
mod ready;
pub mod sim;
mod table;
mod timer;

pub use audit::{AuditRecord, ScheduleAuditLog, ScheduleEvent};
pub use config::EventLoopConfig;
pub use sim::SimPlatform;

use hal::Platform;
use kernel_api::{
    EventId, Fired, KernelError, NextWake, Priority, PriorityGroup, Queue, Ticks,
};
use table::EventTable;

/// Dispatch callback: the loop, the application world, and the fired event
pub type Callback<W, P, const N: usize> = fn(&mut EventLoop<W, P, N>, &mut W, Fired);

/// Priority event loop with a fixed table of `N` events
///
/// `W` is the application world lent to callbacks, `P` the platform
/// supplying time and the wake hook.
pub struct EventLoop<W, P, const N: usize> {
    platform: P,
    table: EventTable<W, P, N>,
    /// One priority-ordered queue per coarse group, indexed by group
    ready: [Queue; PriorityGroup::COUNT],
    /// Bit `g` set iff `ready[g]` is non-empty
    ready_map: u8,
    timers: Queue,
    /// Due tick of the timer queue head
    earliest: Option<Ticks>,
    /// Nesting depth of `schedule()`; the wake hook stays quiet while non-zero
    dispatch_depth: u32,
    next_queue_id: u32,
    last_now: Ticks,
    config: EventLoopConfig,
    audit: ScheduleAuditLog,
}

impl<W, P: Platform, const N: usize> EventLoop<W, P, N> {
    /// Creates an event loop with the default configuration
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, EventLoopConfig::default())
    }

    pub fn with_config(platform: P, config: EventLoopConfig) -> Self {
        Self {
            platform,
            table: EventTable::new(),
            ready: [Queue::new(); PriorityGroup::COUNT],
            ready_map: 0,
            timers: Queue::new(),
            earliest: None,
            dispatch_depth: 0,
            next_queue_id: 0,
            last_now: Ticks::ZERO,
            audit: ScheduleAuditLog::with_capacity(config.audit_capacity),
            config,
        }
    }

    pub fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Returns the scheduling audit trail
    pub fn audit_log(&self) -> &ScheduleAuditLog {
        &self.audit
    }

    pub fn clear_audit_log(&mut self) {
        self.audit.clear();
    }

    /// Registers a detached event
    pub fn register(
        &mut self,
        priority: Priority,
        callback: Callback<W, P, N>,
        context: usize,
    ) -> Result<EventId, KernelError> {
        self.table
            .allocate(priority, callback, context)
            .ok_or(KernelError::TableFull)
    }

    /// Number of registered events
    pub fn event_count(&self) -> usize {
        self.table.live()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn context(&self, event: EventId) -> usize {
        self.table.get(event).context
    }

    /// Runs one scheduling pass
    ///
    /// Promotes every expired timer, then dispatches at most
    /// `max_dispatch_per_schedule` ready events. Returns what the host
    /// should do next.
    pub fn schedule(&mut self, world: &mut W) -> NextWake {
        self.dispatch_depth += 1;

        let now = self.read_clock();
        self.expire_timers(now);

        for _ in 0..self.config.dispatch_budget() {
            let Some(fired) = self.pop_ready() else {
                break;
            };
            self.dispatch(world, fired);
        }

        self.dispatch_depth -= 1;
        self.next_wake()
    }

    /// Calls `schedule()` until no ready work remains
    ///
    /// Future timers are left pending. Returns the final [`NextWake`],
    /// which is never [`NextWake::Now`].
    pub fn run_until_idle(&mut self, world: &mut W) -> NextWake {
        loop {
            let next = self.schedule(world);
            if next != NextWake::Now {
                return next;
            }
        }
    }

    /// Dispatches `event`'s callback synchronously, in-line
    ///
    /// The event's queue membership is not touched.
    pub fn invoke(&mut self, world: &mut W, event: EventId) {
        let slot = self.table.get(event);
        let fired = Fired {
            event,
            context: slot.context,
            priority: slot.priority,
        };
        self.dispatch(world, fired);
    }

    /// What the host should do if it stopped scheduling now
    pub fn next_wake(&self) -> NextWake {
        if self.ready_map != 0 {
            NextWake::Now
        } else if let Some(due) = self.earliest {
            NextWake::At(due)
        } else {
            NextWake::Never
        }
    }

    fn dispatch(&mut self, world: &mut W, fired: Fired) {
        self.record(audit::ScheduleEvent::Dispatched { event: fired.event });
        if let Some(callback) = self.table.get(fired.event).callback {
            callback(self, world, fired);
        }
    }

    fn read_clock(&mut self) -> Ticks {
        self.last_now = Ticks::new(self.platform.poll_ticks());
        self.last_now
    }

    /// Invokes the platform wake hook unless a `schedule()` pass is running
    fn request_wake(&mut self) {
        if self.dispatch_depth == 0 {
            self.record(audit::ScheduleEvent::WakeRequested);
            self.platform.schedule_prepare();
        }
    }

    fn record(&mut self, event: audit::ScheduleEvent) {
        self.audit.record_event(self.last_now, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_api::KernelApi;

    #[derive(Default)]
    struct Trace {
        fired: Vec<usize>,
    }

    type Loop = EventLoop<Trace, SimPlatform, 16>;

    fn note(_: &mut Loop, trace: &mut Trace, fired: Fired) {
        trace.fired.push(fired.context);
    }

    fn repost_self(el: &mut Loop, trace: &mut Trace, fired: Fired) {
        trace.fired.push(fired.context);
        el.post(fired.event).unwrap();
    }

    #[test]
    fn test_register_and_release() {
        let mut el = Loop::new(SimPlatform::new());
        let a = el.register(Priority::LOWER, note, 1).unwrap();
        let b = el.register(Priority::LOWER, note, 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(el.event_count(), 2);
        assert_eq!(el.context(b), 2);

        el.release(a).unwrap();
        assert_eq!(el.event_count(), 1);
        let c = el.register(Priority::LOWER, note, 3).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_table_full() {
        let mut el: EventLoop<Trace, SimPlatform, 2> = EventLoop::new(SimPlatform::new());
        fn cb(_: &mut EventLoop<Trace, SimPlatform, 2>, _: &mut Trace, _: Fired) {}
        el.register(Priority::LOWER, cb, 0).unwrap();
        el.register(Priority::LOWER, cb, 0).unwrap();
        assert_eq!(
            el.register(Priority::LOWER, cb, 0),
            Err(KernelError::TableFull)
        );
    }

    #[test]
    fn test_release_queued_event_fails() {
        let mut el = Loop::new(SimPlatform::new());
        let a = el.register(Priority::LOWER, note, 1).unwrap();
        el.post(a).unwrap();
        assert_eq!(el.release(a), Err(KernelError::AlreadyQueued));
    }

    #[test]
    #[should_panic(expected = "unknown event")]
    fn test_released_handle_panics() {
        let mut el = Loop::new(SimPlatform::new());
        let a = el.register(Priority::LOWER, note, 1).unwrap();
        el.release(a).unwrap();
        let _ = el.post(a);
    }

    #[test]
    fn test_schedule_empty_loop() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        assert_eq!(el.schedule(&mut trace), NextWake::Never);
        assert!(trace.fired.is_empty());
    }

    #[test]
    fn test_dispatch_budget() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        for i in 0..6 {
            let ev = el.register(Priority::MIDDLE, note, i).unwrap();
            el.post(ev).unwrap();
        }

        assert_eq!(el.schedule(&mut trace), NextWake::Now);
        assert_eq!(trace.fired, vec![0, 1, 2, 3]);

        assert_eq!(el.schedule(&mut trace), NextWake::Never);
        assert_eq!(trace.fired, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_custom_dispatch_budget() {
        let config = EventLoopConfig {
            max_dispatch_per_schedule: 2,
            ..EventLoopConfig::default()
        };
        let mut el = Loop::with_config(SimPlatform::new(), config);
        let mut trace = Trace::default();
        for i in 0..3 {
            let ev = el.register(Priority::MIDDLE, note, i).unwrap();
            el.post(ev).unwrap();
        }
        el.schedule(&mut trace);
        assert_eq!(trace.fired.len(), 2);
    }

    #[test]
    fn test_self_reposting_event_does_not_starve_host() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        let ev = el.register(Priority::HIGH, repost_self, 9).unwrap();
        el.post(ev).unwrap();

        assert_eq!(el.schedule(&mut trace), NextWake::Now);
        assert_eq!(trace.fired.len(), 4);
    }

    #[test]
    fn test_run_until_idle() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        for i in 0..10 {
            let ev = el.register(Priority::LOWER, note, i).unwrap();
            el.post(ev).unwrap();
        }
        assert_eq!(el.run_until_idle(&mut trace), NextWake::Never);
        assert_eq!(trace.fired, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_invoke_is_synchronous() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        let ev = el.register(Priority::LOWER, note, 5).unwrap();
        el.invoke(&mut trace, ev);
        assert_eq!(trace.fired, vec![5]);
        assert!(!el.is_queued(ev));
    }

    #[test]
    fn test_wake_hook_on_first_ready_only() {
        let mut el = Loop::new(SimPlatform::new());
        let a = el.register(Priority::LOWER, note, 0).unwrap();
        let b = el.register(Priority::HIGHEST, note, 1).unwrap();

        el.post(a).unwrap();
        el.post(b).unwrap();
        assert_eq!(el.platform().wake_requests(), 1);
    }

    #[test]
    fn test_wake_hook_suppressed_during_schedule() {
        let mut el = Loop::new(SimPlatform::new());
        let mut trace = Trace::default();
        let ev = el.register(Priority::HIGH, repost_self, 0).unwrap();
        el.post(ev).unwrap();
        assert_eq!(el.platform_mut().take_wake_requests(), 1);

        el.schedule(&mut trace);
        assert_eq!(el.platform().wake_requests(), 0);
    }

    #[test]
    fn test_audit_trail_records_dispatch() {
        let config = EventLoopConfig {
            audit_capacity: 32,
            ..EventLoopConfig::default()
        };
        let mut el = Loop::with_config(SimPlatform::new(), config);
        let mut trace = Trace::default();
        let ev = el.register(Priority::HIGH, note, 0).unwrap();
        el.post(ev).unwrap();
        el.schedule(&mut trace);

        let kinds: Vec<ScheduleEvent> = el.audit_log().get_events().map(|r| r.event).collect();
        assert_eq!(
            kinds,
            vec![
                ScheduleEvent::Posted {
                    event: ev,
                    priority: Priority::HIGH
                },
                ScheduleEvent::WakeRequested,
                ScheduleEvent::Dispatched { event: ev },
            ]
        );
    }
}
