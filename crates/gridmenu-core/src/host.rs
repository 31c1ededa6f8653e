//! Capabilities the menu engine consumes from its host environment.
//!
//! The host owns the real display surfaces, the user connections and the
//! task scheduler. The engine only talks to it through [`Surfaces`] and
//! [`Scheduler`]; [`crate::memory::MemoryHost`] is an in-process
//! implementation of both.

use std::fmt;

use crate::item::Item;

/// Identity of a connected viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Host handle for one display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Owner token recorded on every surface a session creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Handle to a repeating scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Number of cells in one row of a chest-like grid.
pub const ROW_WIDTH: usize = 9;

/// Surface types a template can ask the host for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Grid of 9-wide rows whose size the caller chooses.
    Chest,
    /// Single row of five cells.
    Hopper,
    /// 3×3 grid.
    Dispenser,
    /// 3×3 grid.
    Dropper,
}

impl SurfaceKind {
    /// Whether templates of this kind may set their own size.
    pub fn supports_custom_size(self) -> bool {
        matches!(self, SurfaceKind::Chest)
    }

    /// Cell count used when no custom size is set.
    pub fn intrinsic_size(self) -> usize {
        match self {
            SurfaceKind::Chest => 3 * ROW_WIDTH,
            SurfaceKind::Hopper => 5,
            SurfaceKind::Dispenser | SurfaceKind::Dropper => 9,
        }
    }

    /// Cells per row, used to map pattern rows onto linear indices.
    pub fn width(self) -> usize {
        match self {
            SurfaceKind::Chest => ROW_WIDTH,
            SurfaceKind::Hopper => 5,
            SurfaceKind::Dispenser | SurfaceKind::Dropper => 3,
        }
    }
}

/// Resolved shape passed to [`Surfaces::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub kind: SurfaceKind,
    pub size: usize,
}

/// Display primitives provided by the host.
pub trait Surfaces: Send + Sync {
    /// Create a surface owned by `owner`.
    fn create(&self, owner: SessionId, spec: SurfaceSpec, title: &str) -> SurfaceId;

    /// Empty every cell.
    fn clear(&self, surface: SurfaceId);

    /// Write (or empty, with `None`) one cell. Out-of-range indices are ignored.
    fn set_cell(&self, surface: SurfaceId, index: usize, item: Option<Item>);

    /// Cell count of the surface, 0 if the host does not know it.
    fn size(&self, surface: SurfaceId) -> usize;

    /// The surface currently displayed on top for `user`, if any.
    fn current_top_surface(&self, user: UserId) -> Option<SurfaceId>;

    /// Display `surface` to `user`, replacing whatever was on top.
    fn show(&self, user: UserId, surface: SurfaceId);

    /// Close whatever surface `user` is looking at.
    fn hide(&self, user: UserId);

    /// The owning session is closed and will never touch `surface` again.
    fn release(&self, _surface: SurfaceId) {}
}

/// One-shot work for the host's main execution context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Repeating work; the return value decides whether it runs again.
pub type RepeatingTask = Box<dyn FnMut() -> Repeat + Send + 'static>;

/// Outcome of one run of a [`RepeatingTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Continue,
    Stop,
}

/// Serial task scheduler provided by the host. Delays are in host ticks.
pub trait Scheduler: Send + Sync {
    /// Run `task` after `delay_ticks` ticks (at least one).
    fn run_later(&self, delay_ticks: u64, task: Task);

    /// Run `task` on the next tick.
    fn run_next_tick(&self, task: Task) {
        self.run_later(1, task);
    }

    /// Run `task` every `interval` ticks after `initial_delay` ticks. A delay
    /// of zero means the next tick.
    fn run_repeating(&self, initial_delay: u64, interval: u64, task: RepeatingTask) -> TaskHandle;

    /// Stop a repeating task. Unknown or finished handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

/// Everything the engine needs from a host.
pub trait Host: Surfaces + Scheduler {}

impl<T: Surfaces + Scheduler + ?Sized> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_chest_supports_custom_size() {
        assert!(SurfaceKind::Chest.supports_custom_size());
        assert!(!SurfaceKind::Hopper.supports_custom_size());
        assert!(!SurfaceKind::Dispenser.supports_custom_size());
        assert!(!SurfaceKind::Dropper.supports_custom_size());
    }

    #[test]
    fn intrinsic_sizes_fill_whole_rows() {
        for kind in [
            SurfaceKind::Chest,
            SurfaceKind::Hopper,
            SurfaceKind::Dispenser,
            SurfaceKind::Dropper,
        ] {
            assert_eq!(kind.intrinsic_size() % kind.width(), 0, "{kind:?}");
        }
    }

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(UserId(7).to_string(), "user#7");
        assert_eq!(SurfaceId(3).to_string(), "surface#3");
        assert_eq!(SessionId(1).to_string(), "session#1");
    }
}
