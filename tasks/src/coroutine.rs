//! Coroutine protocol
//!
//! A coroutine is re-entered through [`Coroutine::resume`] with the
//! breakpoint it last stopped at, and answers with the [`Step`] it wants to
//! take next.

use kernel_api::{EventId, KernelApi, KernelError};
use serde::{Deserialize, Serialize};

/// Identifies a suspension point inside a coroutine body
///
/// [`Breakpoint::START`] means "from the top"; every other value is chosen
/// by the coroutine author and only has to be unique within one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Breakpoint(u16);

impl Breakpoint {
    pub const START: Breakpoint = Breakpoint(0);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub const fn is_start(self) -> bool {
        self.0 == 0
    }
}

/// What a coroutine does when it gives control back
#[derive(Debug)]
pub enum Step<F> {
    /// Suspend; the next `resume` continues at this breakpoint
    Yield(Breakpoint),
    /// Run `callee` as a nested coroutine, then continue at `resume_at`
    Call { resume_at: Breakpoint, callee: F },
    /// Finish this coroutine and return to its caller
    Return,
}

/// A resumable procedure
///
/// `Self` holds the locals that survive suspension. It is typically an
/// enum with one variant per coroutine body, so that a task's frame stack
/// can hold any of them.
pub trait Coroutine<K: KernelApi + ?Sized>: Sized {
    /// State shared by every coroutine of a task, lent on each resumption
    type Env: ?Sized;

    /// Runs the body from `cx.breakpoint()` up to its next step
    fn resume(&mut self, cx: &mut TaskCx<'_, K>, env: &mut Self::Env) -> Step<Self>;
}

/// Context handed to a running coroutine
pub struct TaskCx<'a, K: ?Sized> {
    pub(crate) kernel: &'a mut K,
    pub(crate) task_event: EventId,
    pub(crate) trigger: Option<EventId>,
    pub(crate) breakpoint: Breakpoint,
    pub(crate) depth: usize,
    pub(crate) ret: &'a mut usize,
}

impl<'a, K: KernelApi + ?Sized> TaskCx<'a, K> {
    pub fn kernel(&mut self) -> &mut K {
        &mut *self.kernel
    }

    /// The task's own event; posting or arming it resumes this task
    pub fn task_event(&self) -> EventId {
        self.task_event
    }

    /// The event whose dispatch caused this resumption
    ///
    /// `None` on the synchronous first entry of a coroutine (task start, or
    /// a nested call) and after an in-line return from a callee.
    pub fn trigger(&self) -> Option<EventId> {
        self.trigger
    }

    /// Whether this resumption was caused by `event`
    pub fn triggered_by(&self, event: EventId) -> bool {
        self.trigger == Some(event)
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Number of frames on the task's stack, this coroutine's included
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Sets the task's return-value slot
    pub fn set_return(&mut self, value: usize) {
        *self.ret = value;
    }

    /// Reads the task's return-value slot, as left by the last callee
    pub fn returned(&self) -> usize {
        *self.ret
    }

    /// Registers a new event that resumes this task when dispatched
    ///
    /// Used to race a timer against another wake-up.
    pub fn inherit(&mut self) -> Result<EventId, KernelError> {
        self.kernel.inherit(self.task_event)
    }
}
