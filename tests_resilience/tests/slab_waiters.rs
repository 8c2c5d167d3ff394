//! Slab Waiter Tests
//!
//! Several worker tasks compete for a slab smaller than their number. Each
//! worker waits for a block, stamps it, holds it for a while on a timer,
//! and frees it. Freed blocks go straight to the oldest waiter.
//!
//! ## Properties
//!
//! - `used + free == total` after every scheduling pass
//! - Waiters are served in arrival order
//! - A cancelled waiter never receives a block, granted or not

use kernel_api::{Fired, KernelApi, Priority, Ticks};
use resources::{Block, Slab};
use tasks::{Breakpoint, Coroutine, Step, Task, TaskCx};
use tests_resilience::{drive_until, run_at, test_bootstrap, TestLoop};

const GRANTED: Breakpoint = Breakpoint::new(1);
const HELD: Breakpoint = Breakpoint::new(2);

struct Pool {
    slab: Slab<'static>,
    /// (worker, tick) for every grant, in order
    grants: Vec<(usize, u64)>,
}

struct Worker {
    id: usize,
    hold: u64,
    block: Option<Block>,
}

impl<K: KernelApi + ?Sized> Coroutine<K> for Worker {
    type Env = Pool;

    fn resume(&mut self, cx: &mut TaskCx<'_, K>, pool: &mut Pool) -> Step<Self> {
        let me = cx.task_event();
        match cx.breakpoint() {
            GRANTED => {
                let block = pool.slab.granted(cx.kernel(), me).unwrap();
                pool.slab.block_mut(&block)[0] = self.id as u8;
                let now = cx.kernel().now().get();
                pool.grants.push((self.id, now));
                self.block = Some(block);
                cx.kernel()
                    .start_timer_after(me, Ticks::new(self.hold))
                    .unwrap();
                Step::Yield(HELD)
            }
            HELD => {
                let block = self.block.take().unwrap();
                assert_eq!(pool.slab.block(&block)[0], self.id as u8);
                pool.slab.free(cx.kernel(), block);
                Step::Return
            }
            _ => {
                pool.slab.wait(cx.kernel(), me).unwrap();
                Step::Yield(GRANTED)
            }
        }
    }
}

struct World {
    workers: Vec<Task<Worker, 1>>,
    pool: Pool,
}

fn on_worker(el: &mut TestLoop<World>, world: &mut World, fired: Fired) {
    let World { workers, pool } = world;
    workers[fired.context].resume(el, Some(fired.event), pool);
}

/// Builds `workers` tasks sharing a slab of `blocks` 16-byte blocks
fn setup(workers: usize, blocks: usize) -> (TestLoop<World>, World) {
    let mut el = test_bootstrap();
    // Spare bytes absorb any alignment offset
    let memory: &'static mut [u8] = Box::leak(vec![0u8; blocks * 16 + 15].into_boxed_slice());
    let slab = Slab::create(&mut el, memory, 16).unwrap();
    assert_eq!(slab.total_blocks(), blocks);

    let workers = (0..workers)
        .map(|id| {
            let event = el.register(Priority::MIDDLE, on_worker, id).unwrap();
            Task::new(&mut el, event)
        })
        .collect();
    let world = World {
        workers,
        pool: Pool {
            slab,
            grants: Vec::new(),
        },
    };
    (el, world)
}

fn start_all(el: &mut TestLoop<World>, world: &mut World, hold: u64) {
    let World { workers, pool } = world;
    for (id, task) in workers.iter_mut().enumerate() {
        let worker = Worker {
            id,
            hold,
            block: None,
        };
        task.start(el, worker, pool).unwrap();
    }
}

fn assert_balanced(slab: &Slab<'_>) {
    assert_eq!(slab.used_blocks() + slab.free_blocks(), slab.total_blocks());
}

// ============================================================================
// Arrival order
// ============================================================================

#[test]
fn test_waiters_served_in_arrival_order() {
    let (mut el, mut world) = setup(4, 2);
    start_all(&mut el, &mut world, 10);

    assert_eq!(world.pool.slab.used_blocks(), 2);
    assert_eq!(world.pool.slab.waiters(), 2);

    for tick in 0..=30 {
        run_at(&mut el, &mut world, tick);
        assert_balanced(&world.pool.slab);
    }

    assert_eq!(world.pool.grants, vec![(0, 0), (1, 0), (2, 10), (3, 10)]);
    assert!(world.workers.iter().all(|task| task.is_ended()));
    assert_eq!(world.pool.slab.used_blocks(), 0);
    assert_eq!(world.pool.slab.waiters(), 0);
}

#[test]
fn test_block_handed_over_without_touching_free_list() {
    let (mut el, mut world) = setup(2, 1);
    start_all(&mut el, &mut world, 5);
    run_at(&mut el, &mut world, 0);
    assert_eq!(world.pool.slab.free_blocks(), 0);

    // Worker 0 frees at tick 5 and worker 1 receives the same block
    run_at(&mut el, &mut world, 5);
    assert_eq!(world.pool.grants, vec![(0, 0), (1, 5)]);
    assert_eq!(world.pool.slab.used_blocks(), 1);
    assert_eq!(world.pool.slab.free_blocks(), 0);

    drive_until(&mut el, &mut world, 50);
    assert_eq!(world.pool.slab.free_blocks(), 1);
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancelled_waiter_skipped() {
    let (mut el, mut world) = setup(3, 1);
    start_all(&mut el, &mut world, 10);
    run_at(&mut el, &mut world, 0);

    let parked = world.workers[1].event();
    world.pool.slab.wait_cancel(&mut el, parked).unwrap();
    assert_eq!(world.pool.slab.waiters(), 1);

    drive_until(&mut el, &mut world, 100);
    assert_eq!(world.pool.grants, vec![(0, 0), (2, 10)]);
    // The cancelled worker is still suspended, waiting for a grant
    assert!(!world.workers[1].is_ended());
    assert_eq!(world.pool.slab.free_blocks(), 1);
}

#[test]
fn test_cancelled_grant_passes_to_next_waiter() {
    let (mut el, mut world) = setup(3, 1);
    start_all(&mut el, &mut world, 10);

    // Worker 0 was granted at start but has not run yet
    let granted = world.workers[0].event();
    assert!(el.is_ready(granted));
    world.pool.slab.wait_cancel(&mut el, granted).unwrap();

    assert!(!el.is_ready(granted));
    assert_eq!(el.attachment(granted), None);
    assert_balanced(&world.pool.slab);

    drive_until(&mut el, &mut world, 100);
    assert_eq!(world.pool.grants, vec![(1, 0), (2, 10)]);
    assert_eq!(world.pool.slab.used_blocks(), 0);
}
