//! Core engine for gridmenu: reusable grid menu templates, per-user menu
//! sessions, and the registry that routes host input to them.
//!
//! The host (display surfaces, task scheduler, input events) is abstracted
//! behind the traits in [`host`]. [`MemoryHost`] implements them in-process.

pub mod button;
pub mod error;
pub mod event;
pub mod host;
pub mod item;
pub mod logging;
pub mod memory;
pub mod pattern;
pub mod registry;
pub mod session;
pub mod template;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use button::{Button, ClickHandler};
pub use error::{MenuError, Result};
pub use event::{ClickEvent, ClickKind, CloseEvent, DragEvent, HostEvent};
pub use host::{
    Host, Repeat, Scheduler, SessionId, SurfaceId, SurfaceKind, SurfaceSpec, Surfaces, TaskHandle,
    UserId, ROW_WIDTH,
};
pub use item::Item;
pub use memory::MemoryHost;
pub use pattern::Pattern;
pub use registry::MenuRegistry;
pub use session::{Session, SessionData};
pub use template::{SessionHandler, Template};

// A panicking handler must not wedge every later menu operation, so
// poisoned locks are taken over as-is.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
