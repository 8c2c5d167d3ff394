//! # Tasks
//!
//! Stackless coroutines driven by the event loop.
//!
//! ## Philosophy
//!
//! **A suspended task is data, not a thread.**
//!
//! A coroutine body is a type implementing [`Coroutine`]: its fields are the
//! locals that survive suspension, and [`Coroutine::resume`] is a jump table
//! keyed by the [`Breakpoint`] it last stopped at. Each call to `resume`
//! runs until the body yields, calls a nested coroutine, or returns.
//!
//! Nested calls push a frame on the task's fixed-depth [`FrameStack`]. If the
//! callee finishes without ever suspending, the caller continues in-line
//! (fast path). If it suspended at least once, the caller's resumption is
//! posted to the event loop as the task's own event (slow path).
//!
//! ## Example
//!
//! ```
//! use event_loop::{EventLoop, SimPlatform};
//! use kernel_api::{Fired, KernelApi, Priority, Ticks};
//! use tasks::{Breakpoint, Coroutine, Step, Task, TaskCx};
//!
//! /// Blinks `n` times, 100 ticks apart
//! struct Blink {
//!     left: u32,
//! }
//!
//! impl<K: KernelApi + ?Sized> Coroutine<K> for Blink {
//!     type Env = u32;
//!
//!     fn resume(&mut self, cx: &mut TaskCx<'_, K>, blinks: &mut u32) -> Step<Self> {
//!         if self.left == 0 {
//!             return Step::Return;
//!         }
//!         *blinks += 1;
//!         self.left -= 1;
//!         let me = cx.task_event();
//!         cx.kernel().start_timer_after(me, Ticks::new(100)).unwrap();
//!         Step::Yield(Breakpoint::new(1))
//!     }
//! }
//!
//! struct World {
//!     task: Task<Blink, 1>,
//!     blinks: u32,
//! }
//!
//! type Loop = EventLoop<World, SimPlatform, 4>;
//!
//! fn on_task(el: &mut Loop, world: &mut World, fired: Fired) {
//!     world.task.resume(el, Some(fired.event), &mut world.blinks);
//! }
//!
//! let mut el = Loop::new(SimPlatform::new());
//! let event = el.register(Priority::MIDDLE, on_task, 0).unwrap();
//! let mut world = World { task: Task::new(&mut el, event), blinks: 0 };
//!
//! world.task.start(&mut el, Blink { left: 3 }, &mut world.blinks).unwrap();
//! for _ in 0..3 {
//!     el.platform_mut().advance_ticks(100);
//!     el.run_until_idle(&mut world);
//! }
//! assert_eq!(world.blinks, 3);
//! assert!(world.task.is_ended());
//! ```

pub mod coroutine;
pub mod stack;
pub mod task;

pub use coroutine::{Breakpoint, Coroutine, Step, TaskCx};
pub use stack::{Frame, FrameStack};
pub use task::Task;
