//! Tasks
//!
//! A task owns a frame stack, a return-value slot, and a LIFO of events to
//! post when its outermost coroutine finishes. Its lifecycle is
//! `ended -> running -> (suspended <-> running) -> ended`, and an ended
//! task can be started again.
//!
//! The task does not own its event. The application registers an event
//! whose callback calls [`Task::resume`], and hands it to [`Task::new`].

use crate::{Coroutine, FrameStack, Step, TaskCx};
use kernel_api::{EventId, KernelApi, KernelError, QueueOrder, WaitQueue};

/// A stackless task running coroutines of type `F`, nested at most
/// `DEPTH` deep
pub struct Task<F, const DEPTH: usize> {
    event: EventId,
    stack: FrameStack<F, DEPTH>,
    ret: usize,
    /// The innermost frame has returned after suspending; it is popped when
    /// the caller is resumed
    returning: bool,
    end_waiters: WaitQueue,
}

impl<F, const DEPTH: usize> Task<F, DEPTH> {
    /// Creates an ended task resumed through `event`
    pub fn new<K: KernelApi + ?Sized>(kernel: &mut K, event: EventId) -> Self {
        Self {
            event,
            stack: FrameStack::new(),
            ret: 0,
            returning: false,
            end_waiters: kernel.wait_queue(QueueOrder::Lifo),
        }
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    /// True when no coroutine is active
    pub fn is_ended(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stack_used_bytes(&self) -> usize {
        self.stack.used_bytes()
    }

    pub fn stack_capacity_bytes(&self) -> usize {
        self.stack.capacity_bytes()
    }

    /// Current content of the return-value slot (cleared when the task ends)
    pub fn return_value(&self) -> usize {
        self.ret
    }

    pub fn end_waiter_count(&self) -> usize {
        self.end_waiters.len()
    }

    /// Starts `root` and runs it synchronously up to its first suspension
    ///
    /// Fails with [`KernelError::TaskBusy`] if a coroutine is still active.
    pub fn start<K>(
        &mut self,
        kernel: &mut K,
        root: F,
        env: &mut <F as Coroutine<K>>::Env,
    ) -> Result<(), KernelError>
    where
        K: KernelApi + ?Sized,
        F: Coroutine<K>,
    {
        if !self.is_ended() {
            return Err(KernelError::TaskBusy);
        }
        self.stack.push(root);
        self.run(kernel, None, env);
        Ok(())
    }

    /// Continues the innermost suspended coroutine
    ///
    /// Call this from the callback of the task's event, or of any event
    /// inherited from it, passing the fired event as `trigger`. Resuming an
    /// ended task does nothing.
    pub fn resume<K>(
        &mut self,
        kernel: &mut K,
        trigger: Option<EventId>,
        env: &mut <F as Coroutine<K>>::Env,
    ) where
        K: KernelApi + ?Sized,
        F: Coroutine<K>,
    {
        if self.is_ended() {
            return;
        }
        if self.returning {
            self.returning = false;
            self.stack.pop();
        }
        self.run(kernel, trigger, env);
    }

    /// Posts `event` when the task next ends
    ///
    /// Waiters are posted newest first.
    pub fn end_wait<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        event: EventId,
    ) -> Result<(), KernelError> {
        kernel.enqueue(&mut self.end_waiters, event)
    }

    /// Withdraws an end waiter, or cancels it if the task already ended and
    /// the waiter is ready but not yet dispatched
    pub fn end_wait_cancel<K: KernelApi + ?Sized>(
        &mut self,
        kernel: &mut K,
        event: EventId,
    ) -> Result<(), KernelError> {
        if kernel.is_ready(event) {
            kernel.cancel(event)
        } else {
            kernel.withdraw(&mut self.end_waiters, event)
        }
    }

    fn run<K>(&mut self, kernel: &mut K, mut trigger: Option<EventId>, env: &mut <F as Coroutine<K>>::Env)
    where
        K: KernelApi + ?Sized,
        F: Coroutine<K>,
    {
        loop {
            let depth = self.stack.len();
            let Some(frame) = self.stack.top_mut() else {
                return;
            };
            let mut cx = TaskCx {
                kernel: &mut *kernel,
                task_event: self.event,
                trigger,
                breakpoint: frame.breakpoint,
                depth,
                ret: &mut self.ret,
            };

            match frame.locals.resume(&mut cx, env) {
                Step::Yield(breakpoint) => {
                    frame.breakpoint = breakpoint;
                    frame.suspended = true;
                    return;
                }
                Step::Call { resume_at, callee } => {
                    frame.breakpoint = resume_at;
                    self.stack.push(callee);
                    trigger = None;
                }
                Step::Return => {
                    let suspended = frame.suspended;
                    match self.stack.caller_mut() {
                        None => {
                            self.finish(kernel);
                            return;
                        }
                        Some(caller) if suspended => {
                            // The caller's in-line continuation is gone, so
                            // it resumes from the scheduler. It has now
                            // suspended too, which its own return must honour.
                            caller.suspended = true;
                            match kernel.post(self.event) {
                                Ok(()) => {
                                    self.returning = true;
                                    return;
                                }
                                // The task event is still armed elsewhere (a
                                // pending timer, a waiter queue). Its later
                                // dispatch belongs to the caller's own wait,
                                // so the caller continues in-line now.
                                Err(_) => {
                                    self.stack.pop();
                                    trigger = None;
                                }
                            }
                        }
                        Some(_) => {
                            self.stack.pop();
                            trigger = None;
                        }
                    }
                }
            }
        }
    }

    fn finish<K: KernelApi + ?Sized>(&mut self, kernel: &mut K) {
        self.stack.clear();
        self.ret = 0;
        self.returning = false;
        while let Some(waiter) = kernel.dequeue(&mut self.end_waiters) {
            // Dequeued waiters are detached
            let _ = kernel.post(waiter);
        }
    }
}
