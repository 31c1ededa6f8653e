use std::time::Instant;

use crate::host::{SurfaceId, UserId};

/// Mouse/keyboard gesture behind a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickKind {
    #[default]
    Left,
    Right,
    Middle,
    ShiftLeft,
    ShiftRight,
}

impl ClickKind {
    pub fn is_shift(self) -> bool {
        matches!(self, ClickKind::ShiftLeft | ClickKind::ShiftRight)
    }

    pub fn is_right(self) -> bool {
        matches!(self, ClickKind::Right | ClickKind::ShiftRight)
    }
}

/// A click on one raw slot of a surface.
///
/// `raw_slot` is signed because hosts report clicks outside the grid with
/// negative sentinels. Cancelling tells the host to skip its default
/// handling (e.g. letting the user pick the item up).
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub user: UserId,
    pub surface: SurfaceId,
    pub raw_slot: i32,
    pub kind: ClickKind,
    pub at: Instant,
    cancelled: bool,
}

impl ClickEvent {
    pub fn new(user: UserId, surface: SurfaceId, raw_slot: i32, at: Instant) -> Self {
        Self {
            user,
            surface,
            raw_slot,
            kind: ClickKind::Left,
            at,
            cancelled: false,
        }
    }

    pub fn with_kind(mut self, kind: ClickKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A drag gesture spreading across several raw slots.
#[derive(Debug, Clone)]
pub struct DragEvent {
    pub user: UserId,
    pub surface: SurfaceId,
    pub raw_slots: Vec<i32>,
    cancelled: bool,
}

impl DragEvent {
    pub fn new(user: UserId, surface: SurfaceId, raw_slots: Vec<i32>) -> Self {
        Self {
            user,
            surface,
            raw_slots,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// The host stopped displaying `surface` to `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseEvent {
    pub user: UserId,
    pub surface: SurfaceId,
}

/// Notifications the host delivers to the registry.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Click(ClickEvent),
    Drag(DragEvent),
    Close(CloseEvent),
}

impl HostEvent {
    /// The user the notification originated from.
    pub fn user(&self) -> UserId {
        match self {
            HostEvent::Click(ev) => ev.user,
            HostEvent::Drag(ev) => ev.user,
            HostEvent::Close(ev) => ev.user,
        }
    }

    /// Whether the host should skip its default handling. Close events are
    /// never cancellable.
    pub fn is_cancelled(&self) -> bool {
        match self {
            HostEvent::Click(ev) => ev.is_cancelled(),
            HostEvent::Drag(ev) => ev.is_cancelled(),
            HostEvent::Close(_) => false,
        }
    }
}
