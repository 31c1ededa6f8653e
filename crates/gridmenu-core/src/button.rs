use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MenuError, Result};
use crate::event::ClickEvent;
use crate::item::Item;
use crate::session::Session;

/// Callback run when a recognised button is clicked.
pub type ClickHandler = Arc<dyn Fn(&Session, &mut ClickEvent) -> anyhow::Result<()> + Send + Sync>;

/// Frame sequence for an animated button.
///
/// The cursor lives with the button, so every session showing the same
/// template sees the same frame.
struct Animation {
    frames: Vec<Item>,
    speed: u64,
    cursor: AtomicUsize,
}

/// One interactive cell of a template.
pub struct Button {
    icon: Item,
    on_click: Option<ClickHandler>,
    updatable: bool,
    click_cooldown: Duration,
    animation: Option<Animation>,
}

impl Button {
    /// A button without a click handler. Clicks on it are still swallowed.
    pub fn new(icon: impl Into<Item>) -> Self {
        Self {
            icon: icon.into(),
            on_click: None,
            updatable: false,
            click_cooldown: Duration::ZERO,
            animation: None,
        }
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Session, &mut ClickEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Run the template update handler before this button is placed on
    /// every render.
    pub fn updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    /// Minimum time between two accepted clicks on this cell, per session.
    pub fn click_cooldown(mut self, cooldown: Duration) -> Self {
        self.click_cooldown = cooldown;
        self
    }

    /// Cycle through `frames`, advancing one frame per animation tick.
    /// `speed` is the preferred tick interval.
    pub fn animation(mut self, frames: Vec<Item>, speed: u64) -> Result<Self> {
        if frames.is_empty() {
            return Err(MenuError::InvalidArgument(
                "animation frames must not be empty".into(),
            ));
        }
        if speed == 0 {
            return Err(MenuError::InvalidArgument(
                "animation speed must be at least 1 tick".into(),
            ));
        }
        self.icon = frames[0].clone();
        self.animation = Some(Animation {
            frames,
            speed,
            cursor: AtomicUsize::new(0),
        });
        Ok(self)
    }

    /// The item to place in the cell right now.
    pub fn icon(&self) -> Item {
        match &self.animation {
            Some(anim) => anim.frames[anim.cursor.load(Ordering::Acquire)].clone(),
            None => self.icon.clone(),
        }
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn cooldown(&self) -> Duration {
        self.click_cooldown
    }

    pub fn has_click_handler(&self) -> bool {
        self.on_click.is_some()
    }

    pub(crate) fn click_handler(&self) -> Option<&ClickHandler> {
        self.on_click.as_ref()
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    pub fn animation_speed(&self) -> Option<u64> {
        self.animation.as_ref().map(|anim| anim.speed)
    }

    pub fn frame_count(&self) -> usize {
        self.animation.as_ref().map_or(0, |anim| anim.frames.len())
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.animation
            .as_ref()
            .map(|anim| anim.cursor.load(Ordering::Acquire))
    }

    /// Move to the next frame, wrapping at the end. No-op when not animated.
    pub fn advance_frame(&self) {
        if let Some(anim) = &self.animation {
            let len = anim.frames.len();
            let _ = anim
                .cursor
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                    Some((cur + 1) % len)
                });
        }
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("icon", &self.icon())
            .field("has_click_handler", &self.has_click_handler())
            .field("updatable", &self.updatable)
            .field("click_cooldown", &self.click_cooldown)
            .field("frames", &self.frame_count())
            .field("current_frame", &self.current_frame())
            .finish()
    }
}
