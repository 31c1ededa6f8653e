//! An in-process host: surfaces in memory, a tick-driven scheduler and an
//! outbox of host notifications.
//!
//! Nothing runs on its own. The driver calls [`MemoryHost::tick`] to run due
//! tasks and drains [`MemoryHost::drain_events`] into the registry, which
//! keeps the whole engine deterministic under test.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use crate::event::{CloseEvent, HostEvent};
use crate::host::{
    Repeat, RepeatingTask, Scheduler, SessionId, SurfaceId, SurfaceKind, SurfaceSpec, Surfaces,
    Task, TaskHandle, UserId,
};
use crate::item::Item;
use crate::lock;

struct SurfaceRecord {
    owner: SessionId,
    kind: SurfaceKind,
    title: String,
    cells: Vec<Option<Item>>,
    mutations: u64,
}

#[derive(Default)]
struct SurfaceTable {
    next_surface: u64,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    top: HashMap<UserId, SurfaceId>,
}

struct OneShot {
    due: u64,
    task: Task,
}

struct Repeating {
    next_due: u64,
    interval: u64,
    /// Taken out while the task runs.
    task: Option<RepeatingTask>,
}

#[derive(Default)]
struct Clock {
    tick: u64,
    next_handle: u64,
    once: Vec<OneShot>,
    repeating: BTreeMap<TaskHandle, Repeating>,
}

/// Host implementation backed by plain maps.
#[derive(Default)]
pub struct MemoryHost {
    display: Mutex<SurfaceTable>,
    clock: Mutex<Clock>,
    outbox: Mutex<VecDeque<HostEvent>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick: run due one-shot tasks in scheduling order, then
    /// due repeating tasks. Tasks scheduled while ticking run on a later tick.
    pub fn tick(&self) {
        let (now, due) = {
            let mut clock = lock(&self.clock);
            clock.tick += 1;
            let now = clock.tick;
            let (due, pending): (Vec<OneShot>, Vec<OneShot>) =
                clock.once.drain(..).partition(|task| task.due <= now);
            clock.once = pending;
            (now, due)
        };

        for task in due {
            (task.task)();
        }

        let handles: Vec<TaskHandle> = lock(&self.clock)
            .repeating
            .iter()
            .filter(|(_, entry)| entry.next_due <= now)
            .map(|(handle, _)| *handle)
            .collect();

        for handle in handles {
            let task = lock(&self.clock)
                .repeating
                .get_mut(&handle)
                .and_then(|entry| entry.task.take());
            let Some(mut task) = task else {
                continue;
            };

            let outcome = task();

            let mut clock = lock(&self.clock);
            match outcome {
                Repeat::Continue => {
                    if let Some(entry) = clock.repeating.get_mut(&handle) {
                        entry.task = Some(task);
                        entry.next_due = now + entry.interval;
                    }
                }
                Repeat::Stop => {
                    clock.repeating.remove(&handle);
                }
            }
        }
    }

    pub fn run_ticks(&self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    pub fn current_tick(&self) -> u64 {
        lock(&self.clock).tick
    }

    /// One-shot tasks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        lock(&self.clock).once.len()
    }

    /// Repeating tasks still scheduled.
    pub fn repeating_tasks(&self) -> usize {
        lock(&self.clock).repeating.len()
    }

    pub fn cell(&self, surface: SurfaceId, index: usize) -> Option<Item> {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .and_then(|record| record.cells.get(index).cloned().flatten())
    }

    pub fn cells(&self, surface: SurfaceId) -> Vec<Option<Item>> {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map(|record| record.cells.clone())
            .unwrap_or_default()
    }

    pub fn title(&self, surface: SurfaceId) -> Option<String> {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map(|record| record.title.clone())
    }

    pub fn kind(&self, surface: SurfaceId) -> Option<SurfaceKind> {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map(|record| record.kind)
    }

    pub fn owner(&self, surface: SurfaceId) -> Option<SessionId> {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map(|record| record.owner)
    }

    /// Count of clears and cell writes applied to `surface`.
    pub fn mutation_count(&self, surface: SurfaceId) -> u64 {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map_or(0, |record| record.mutations)
    }

    /// Default host handling of an uncancelled click: the user picks the
    /// item up, leaving the cell empty.
    pub fn take_cell(&self, surface: SurfaceId, index: usize) -> Option<Item> {
        let mut display = lock(&self.display);
        let record = display.surfaces.get_mut(&surface)?;
        let item = record.cells.get_mut(index)?.take();
        if item.is_some() {
            record.mutations += 1;
        }
        item
    }

    /// The user dismisses whatever they are looking at.
    pub fn user_close(&self, user: UserId) {
        self.hide(user);
    }

    /// Notifications emitted since the last drain, oldest first.
    pub fn drain_events(&self) -> Vec<HostEvent> {
        lock(&self.outbox).drain(..).collect()
    }

    pub fn has_events(&self) -> bool {
        !lock(&self.outbox).is_empty()
    }

    fn emit_close(&self, user: UserId, surface: SurfaceId) {
        lock(&self.outbox).push_back(HostEvent::Close(CloseEvent { user, surface }));
    }
}

impl Surfaces for MemoryHost {
    fn create(&self, owner: SessionId, spec: SurfaceSpec, title: &str) -> SurfaceId {
        let mut display = lock(&self.display);
        display.next_surface += 1;
        let id = SurfaceId(display.next_surface);
        display.surfaces.insert(
            id,
            SurfaceRecord {
                owner,
                kind: spec.kind,
                title: title.to_string(),
                cells: vec![None; spec.size],
                mutations: 0,
            },
        );
        id
    }

    fn clear(&self, surface: SurfaceId) {
        if let Some(record) = lock(&self.display).surfaces.get_mut(&surface) {
            record.cells.iter_mut().for_each(|cell| *cell = None);
            record.mutations += 1;
        }
    }

    fn set_cell(&self, surface: SurfaceId, index: usize, item: Option<Item>) {
        if let Some(record) = lock(&self.display).surfaces.get_mut(&surface) {
            if let Some(cell) = record.cells.get_mut(index) {
                *cell = item;
                record.mutations += 1;
            }
        }
    }

    fn size(&self, surface: SurfaceId) -> usize {
        lock(&self.display)
            .surfaces
            .get(&surface)
            .map_or(0, |record| record.cells.len())
    }

    fn current_top_surface(&self, user: UserId) -> Option<SurfaceId> {
        lock(&self.display).top.get(&user).copied()
    }

    fn show(&self, user: UserId, surface: SurfaceId) {
        let previous = lock(&self.display).top.insert(user, surface);
        if let Some(previous) = previous.filter(|&previous| previous != surface) {
            self.emit_close(user, previous);
        }
    }

    fn hide(&self, user: UserId) {
        let previous = lock(&self.display).top.remove(&user);
        if let Some(previous) = previous {
            self.emit_close(user, previous);
        }
    }

    fn release(&self, surface: SurfaceId) {
        let mut display = lock(&self.display);
        display.surfaces.remove(&surface);
        display.top.retain(|_, top| *top != surface);
    }
}

impl Scheduler for MemoryHost {
    fn run_later(&self, delay_ticks: u64, task: Task) {
        let mut clock = lock(&self.clock);
        let due = clock.tick + delay_ticks.max(1);
        clock.once.push(OneShot { due, task });
    }

    fn run_repeating(&self, initial_delay: u64, interval: u64, task: RepeatingTask) -> TaskHandle {
        let mut clock = lock(&self.clock);
        clock.next_handle += 1;
        let handle = TaskHandle(clock.next_handle);
        let next_due = clock.tick + initial_delay.max(1);
        clock.repeating.insert(
            handle,
            Repeating {
                next_due,
                interval: interval.max(1),
                task: Some(task),
            },
        );
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        lock(&self.clock).repeating.remove(&handle);
    }
}
