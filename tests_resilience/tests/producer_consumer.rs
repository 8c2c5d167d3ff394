//! Producer/Consumer Tests
//!
//! Two tasks share a bounded buffer guarded by a pair of counting
//! semaphores: `slots` counts free places, `items` counts queued values.
//! The consumer is slower than the producer, so the producer repeatedly
//! blocks on a full buffer.
//!
//! ## Properties
//!
//! - Every value is consumed exactly once, in order
//! - The buffer never exceeds its capacity
//! - `slots + items == capacity` whenever no task is mid-step

use std::collections::VecDeque;

use kernel_api::{Fired, KernelApi, Priority, Ticks};
use resources::Semaphore;
use tasks::{Breakpoint, Coroutine, Step, Task, TaskCx};
use tests_resilience::{drive_until, test_bootstrap, TestLoop};

const CAPACITY: u32 = 3;

const GOT_SLOT: Breakpoint = Breakpoint::new(1);
const GOT_ITEM: Breakpoint = Breakpoint::new(1);
const RESTED: Breakpoint = Breakpoint::new(2);

struct Shared {
    slots: Semaphore,
    items: Semaphore,
    buffer: VecDeque<u32>,
    consumed: Vec<u32>,
    high_water: usize,
}

struct Producer {
    next: u32,
    total: u32,
}

impl Producer {
    fn wait_slot<K: KernelApi + ?Sized>(
        &mut self,
        cx: &mut TaskCx<'_, K>,
        shared: &mut Shared,
    ) -> Step<Self> {
        if self.next == self.total {
            return Step::Return;
        }
        let me = cx.task_event();
        shared.slots.take(cx.kernel(), Some(me)).unwrap();
        Step::Yield(GOT_SLOT)
    }
}

impl<K: KernelApi + ?Sized> Coroutine<K> for Producer {
    type Env = Shared;

    fn resume(&mut self, cx: &mut TaskCx<'_, K>, shared: &mut Shared) -> Step<Self> {
        if cx.breakpoint() == GOT_SLOT {
            shared.buffer.push_back(self.next);
            shared.high_water = shared.high_water.max(shared.buffer.len());
            shared.items.give(cx.kernel(), None).unwrap();
            self.next += 1;
        }
        self.wait_slot(cx, shared)
    }
}

struct Consumer {
    remaining: u32,
    rest: u64,
}

impl<K: KernelApi + ?Sized> Coroutine<K> for Consumer {
    type Env = Shared;

    fn resume(&mut self, cx: &mut TaskCx<'_, K>, shared: &mut Shared) -> Step<Self> {
        let me = cx.task_event();
        match cx.breakpoint() {
            GOT_ITEM => {
                let value = shared.buffer.pop_front().unwrap();
                shared.consumed.push(value);
                shared.slots.give(cx.kernel(), None).unwrap();
                self.remaining -= 1;
                if self.remaining == 0 {
                    return Step::Return;
                }
                cx.kernel()
                    .start_timer_after(me, Ticks::new(self.rest))
                    .unwrap();
                Step::Yield(RESTED)
            }
            _ => {
                shared.items.take(cx.kernel(), Some(me)).unwrap();
                Step::Yield(GOT_ITEM)
            }
        }
    }
}

struct World {
    producer: Task<Producer, 1>,
    consumer: Task<Consumer, 1>,
    shared: Shared,
}

fn on_producer(el: &mut TestLoop<World>, world: &mut World, fired: Fired) {
    world.producer.resume(el, Some(fired.event), &mut world.shared);
}

fn on_consumer(el: &mut TestLoop<World>, world: &mut World, fired: Fired) {
    world.consumer.resume(el, Some(fired.event), &mut world.shared);
}

fn setup(producer_priority: Priority, consumer_priority: Priority) -> (TestLoop<World>, World) {
    let mut el = test_bootstrap();
    let producer = el.register(producer_priority, on_producer, 0).unwrap();
    let consumer = el.register(consumer_priority, on_consumer, 1).unwrap();
    let world = World {
        producer: Task::new(&mut el, producer),
        consumer: Task::new(&mut el, consumer),
        shared: Shared {
            slots: Semaphore::new(&mut el, CAPACITY, CAPACITY),
            items: Semaphore::new(&mut el, 0, CAPACITY),
            buffer: VecDeque::new(),
            consumed: Vec::new(),
            high_water: 0,
        },
    };
    (el, world)
}

fn start(el: &mut TestLoop<World>, world: &mut World, total: u32, rest: u64) {
    world
        .consumer
        .start(
            el,
            Consumer {
                remaining: total,
                rest,
            },
            &mut world.shared,
        )
        .unwrap();
    world
        .producer
        .start(el, Producer { next: 0, total }, &mut world.shared)
        .unwrap();
}

// ============================================================================
// Ordering and accounting
// ============================================================================

#[test]
fn test_every_value_consumed_in_order() {
    let (mut el, mut world) = setup(Priority::MIDDLE, Priority::MIDDLE);
    start(&mut el, &mut world, 10, 3);

    drive_until(&mut el, &mut world, 1_000);

    assert_eq!(world.shared.consumed, (0..10).collect::<Vec<_>>());
    assert!(world.producer.is_ended());
    assert!(world.consumer.is_ended());
    assert!(world.shared.buffer.is_empty());
    assert_eq!(world.shared.slots.count(), CAPACITY);
    assert_eq!(world.shared.items.count(), 0);
}

#[test]
fn test_buffer_bounded_by_capacity() {
    let (mut el, mut world) = setup(Priority::HIGH, Priority::LOWER);
    start(&mut el, &mut world, 12, 5);

    let mut tick = 0;
    while !(world.producer.is_ended() && world.consumer.is_ended()) {
        tick += 1;
        assert!(tick < 1_000, "pipeline stalled");
        el.platform_mut().set_ticks(tick);
        el.run_until_idle(&mut world);

        let shared = &world.shared;
        assert!(shared.buffer.len() <= CAPACITY as usize);
        assert_eq!(shared.items.count() as usize, shared.buffer.len());
        assert_eq!(
            shared.slots.count() + shared.items.count(),
            CAPACITY
        );
    }

    assert_eq!(world.shared.high_water, CAPACITY as usize);
    assert_eq!(world.shared.consumed.len(), 12);
}

#[test]
fn test_consumer_with_zero_rest_drains_everything() {
    let (mut el, mut world) = setup(Priority::LOWER, Priority::HIGHEST);
    start(&mut el, &mut world, 6, 0);

    // A zero rest re-arms at the current tick, so no time has to pass
    drive_until(&mut el, &mut world, 0);

    assert_eq!(world.shared.consumed, (0..6).collect::<Vec<_>>());
    assert!(world.shared.buffer.is_empty());
    assert!(world.consumer.is_ended());
    assert_eq!(el.platform().current_ticks(), 0);
}
