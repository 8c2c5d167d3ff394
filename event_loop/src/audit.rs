//! Scheduling Audit Trail
//!
//! A bounded, chronological record of what the event loop did: posts,
//! cancellations, dispatches, timer lifecycle and wake requests.
//!
//! ## Philosophy
//!
//! - Deterministic: records are kept in the order the loop produced them
//! - Queryable: tests assert on the trail instead of instrumenting callbacks
//! - Bounded: the buffer is allocated once; when full the oldest record
//!   is dropped, so a long-running loop never grows
//! - Off by default: a capacity of zero records nothing and allocates nothing
//!
//! ## Example
//!
//! ```
//! use event_loop::audit::{ScheduleAuditLog, ScheduleEvent};
//! use kernel_api::{EventId, Priority, Ticks};
//!
//! let mut log = ScheduleAuditLog::with_capacity(8);
//! let ev = EventId::from_index(0);
//! log.record_event(Ticks::new(10), ScheduleEvent::Posted { event: ev, priority: Priority::HIGH });
//! log.record_event(Ticks::new(12), ScheduleEvent::Dispatched { event: ev });
//!
//! assert_eq!(log.len(), 2);
//! assert!(log.has_event(|e| matches!(e, ScheduleEvent::Dispatched { .. })));
//! ```

use kernel_api::{EventId, Priority, Ticks};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Something the event loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Event entered a ready queue
    Posted { event: EventId, priority: Priority },
    /// Ready event was removed before dispatch
    Cancelled { event: EventId },
    /// Ready event was popped and its callback invoked
    Dispatched { event: EventId },
    /// Timer entered the timer queue
    TimerStarted { event: EventId, due: Ticks },
    /// Timer was due and moved to the ready engine
    TimerExpired { event: EventId },
    /// Timer was removed from the timer queue before it fired
    TimerStopped { event: EventId },
    /// The platform wake hook was invoked
    WakeRequested,
}

impl ScheduleEvent {
    /// The event this record is about, if any
    pub fn event_id(&self) -> Option<EventId> {
        match *self {
            ScheduleEvent::Posted { event, .. }
            | ScheduleEvent::Cancelled { event }
            | ScheduleEvent::Dispatched { event }
            | ScheduleEvent::TimerStarted { event, .. }
            | ScheduleEvent::TimerExpired { event }
            | ScheduleEvent::TimerStopped { event } => Some(event),
            ScheduleEvent::WakeRequested => None,
        }
    }
}

/// A single audit record with the tick it was taken at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Last clock reading of the loop when the record was made
    pub at: Ticks,
    pub event: ScheduleEvent,
}

/// Bounded audit log of scheduling activity
#[derive(Debug, Clone, Default)]
pub struct ScheduleAuditLog {
    records: VecDeque<AuditRecord>,
    capacity: usize,
    dropped: u64,
}

impl ScheduleAuditLog {
    /// Creates a log holding at most `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Creates a log that records nothing
    pub fn disabled() -> Self {
        Self::with_capacity(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Records an event, evicting the oldest record when full
    pub fn record_event(&mut self, at: Ticks, event: ScheduleEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(AuditRecord { at, event });
    }

    /// Returns all retained records, oldest first
    pub fn get_events(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter()
    }

    /// Returns the retained records about one event
    pub fn events_for(&self, event: EventId) -> impl Iterator<Item = &AuditRecord> {
        self.records
            .iter()
            .filter(move |r| r.event.event_id() == Some(event))
    }

    /// Counts records matching a predicate
    pub fn count_events<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&ScheduleEvent) -> bool,
    {
        self.records.iter().filter(|r| predicate(&r.event)).count()
    }

    /// Checks whether any record matches a predicate
    pub fn has_event<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&ScheduleEvent) -> bool,
    {
        self.records.iter().any(|r| predicate(&r.event))
    }

    /// Number of records evicted because the log was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Clears all retained records
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(i: usize) -> EventId {
        EventId::from_index(i)
    }

    #[test]
    fn test_disabled_log_records_nothing() {
        let mut log = ScheduleAuditLog::disabled();
        log.record_event(Ticks::ZERO, ScheduleEvent::WakeRequested);
        assert!(log.is_empty());
        assert!(!log.is_enabled());
        assert_eq!(log.dropped(), 0);
    }

    #[test]
    fn test_oldest_record_evicted() {
        let mut log = ScheduleAuditLog::with_capacity(2);
        log.record_event(Ticks::new(1), ScheduleEvent::Dispatched { event: ev(1) });
        log.record_event(Ticks::new(2), ScheduleEvent::Dispatched { event: ev(2) });
        log.record_event(Ticks::new(3), ScheduleEvent::Dispatched { event: ev(3) });

        let at: Vec<u64> = log.get_events().map(|r| r.at.get()).collect();
        assert_eq!(at, vec![2, 3]);
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_query_helpers() {
        let mut log = ScheduleAuditLog::with_capacity(16);
        log.record_event(
            Ticks::new(0),
            ScheduleEvent::TimerStarted {
                event: ev(0),
                due: Ticks::new(50),
            },
        );
        log.record_event(Ticks::new(50), ScheduleEvent::TimerExpired { event: ev(0) });
        log.record_event(Ticks::new(50), ScheduleEvent::Dispatched { event: ev(1) });
        log.record_event(Ticks::new(50), ScheduleEvent::WakeRequested);

        assert_eq!(log.events_for(ev(0)).count(), 2);
        assert_eq!(
            log.count_events(|e| matches!(e, ScheduleEvent::Dispatched { .. })),
            1
        );
        assert!(log.has_event(|e| *e == ScheduleEvent::WakeRequested));

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_record_serializes() {
        let record = AuditRecord {
            at: Ticks::new(7),
            event: ScheduleEvent::Cancelled { event: ev(4) },
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
