use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use gridmenu_config::MenuConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::event::{ClickEvent, DragEvent};
use crate::host::{Host, Repeat, SessionId, SurfaceId, TaskHandle, UserId};
use crate::item::Item;
use crate::lock;
use crate::template::{SessionHandler, Template};

/// Per-session key/value bag handed to [`crate::MenuRegistry::open`].
pub type SessionData = HashMap<String, Value>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A live menu: one template bound to one user and a private data bag.
///
/// `Session` is a cheap handle; clones refer to the same live menu. Sessions
/// are created by [`crate::MenuRegistry::open`] and move from open to
/// closed exactly once.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: SessionId,
    user: UserId,
    template: Arc<Template>,
    surface: SurfaceId,
    size: usize,
    host: Arc<dyn Host>,
    per_button_update: bool,
    suppress_unbound_clicks: bool,
    default_animation_interval: u64,
    state: Mutex<SessionState>,
}

struct SessionState {
    data: SessionData,
    cooldowns: HashMap<usize, Instant>,
    closed: bool,
    animation: Option<TaskHandle>,
}

impl Session {
    pub(crate) fn new(
        user: UserId,
        template: Arc<Template>,
        data: SessionData,
        host: Arc<dyn Host>,
        config: &MenuConfig,
    ) -> Self {
        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let surface = host.create(id, template.surface_spec(), template.title());
        let size = host.size(surface);

        Self {
            inner: Arc::new(SessionInner {
                id,
                user,
                template,
                surface,
                size,
                host,
                per_button_update: config.dispatch.per_button_update,
                suppress_unbound_clicks: config.dispatch.suppress_unbound_clicks,
                default_animation_interval: config.scheduler.default_animation_interval,
                state: Mutex::new(SessionState {
                    data,
                    cooldowns: HashMap::new(),
                    closed: false,
                    animation: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn user(&self) -> UserId {
        self.inner.user
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.inner.template
    }

    pub fn surface(&self) -> SurfaceId {
        self.inner.surface
    }

    /// Cell count of the surface as reported by the host.
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Whether `surface` is the one this session created.
    pub fn owns(&self, surface: SurfaceId) -> bool {
        self.inner.surface == surface
    }

    /// Whether both handles refer to the same live menu.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner.state).closed
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.inner.state).animation.is_some()
    }

    /// Snapshot of the data bag.
    pub fn data(&self) -> SessionData {
        lock(&self.inner.state).data.clone()
    }

    pub fn data_value(&self, key: &str) -> Option<Value> {
        lock(&self.inner.state).data.get(key).cloned()
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set_data(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        lock(&self.inner.state).data.insert(key.into(), value.into())
    }

    pub fn remove_data(&self, key: &str) -> Option<Value> {
        lock(&self.inner.state).data.remove(key)
    }

    /// Write one cell directly, e.g. from an update handler drawing dynamic
    /// content. Ignored once closed or outside the surface.
    pub fn set_item(&self, index: usize, item: Option<Item>) {
        if index >= self.inner.size || self.is_closed() {
            return;
        }
        self.inner.host.set_cell(self.inner.surface, index, item);
    }

    /// Re-derive the whole surface from the template.
    ///
    /// Clears the surface, stamps patterns in order, then places buttons in
    /// ascending index order. With `dispatch.per_button_update` enabled the
    /// update handler also runs before each updatable button, so it may run
    /// up to K+1 times per render for K updatable buttons. If the surface is
    /// not on top for the user, showing it is scheduled for the next tick.
    pub fn render(&self) {
        if self.is_closed() {
            return;
        }

        let host = &self.inner.host;
        let surface = self.inner.surface;
        let template = &self.inner.template;

        host.clear(surface);
        for pattern in template.patterns() {
            pattern.apply(&**host, surface, template.width());
        }

        for (&index, button) in template.buttons() {
            if button.is_updatable() && self.inner.per_button_update && !self.run_update_handler()
            {
                return;
            }
            if index < self.inner.size {
                host.set_cell(surface, index, Some(button.icon()));
            }
        }

        if !self.run_update_handler() {
            return;
        }

        if host.current_top_surface(self.inner.user) != Some(surface) {
            self.schedule_show();
        }
    }

    /// Returns `false` if the handler closed the session.
    fn run_update_handler(&self) -> bool {
        if let Some(handler) = self.inner.template.update_handler() {
            self.invoke(handler, "update");
        }
        !self.is_closed()
    }

    fn invoke(&self, handler: &SessionHandler, hook: &'static str) {
        if let Err(err) = handler(self) {
            warn!(
                template = %self.inner.template.id(),
                user = %self.inner.user,
                hook,
                error = %err,
                "menu handler failed"
            );
        }
    }

    fn schedule_show(&self) {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        self.inner.host.run_next_tick(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if lock(&inner.state).closed {
                return;
            }
            inner.host.show(inner.user, inner.surface);
        }));
    }

    fn slot_index(&self, raw_slot: i32) -> Option<usize> {
        usize::try_from(raw_slot)
            .ok()
            .filter(|&index| index < self.inner.size)
    }

    /// Run the button bound to the clicked slot.
    ///
    /// Clicks on bound cells are always cancelled, including ones dropped
    /// by the cooldown. Clicks on unbound cells pass through to the host
    /// unless `dispatch.suppress_unbound_clicks` is set.
    pub fn handle_click(&self, event: &mut ClickEvent) {
        if self.is_closed() {
            return;
        }
        let Some(index) = self.slot_index(event.raw_slot) else {
            return;
        };
        let Some(button) = self.inner.template.button_at(index) else {
            if self.inner.suppress_unbound_clicks {
                event.cancel();
            }
            return;
        };

        let cooldown = button.cooldown();
        if !cooldown.is_zero() {
            let mut state = lock(&self.inner.state);
            let cooling = state
                .cooldowns
                .get(&index)
                .is_some_and(|last| event.at.saturating_duration_since(*last) < cooldown);
            if cooling {
                drop(state);
                debug!(user = %self.inner.user, slot = index, "click dropped by cooldown");
                event.cancel();
                return;
            }
            state.cooldowns.insert(index, event.at);
        }

        if let Some(handler) = button.click_handler() {
            if let Err(err) = handler(self, event) {
                warn!(
                    template = %self.inner.template.id(),
                    user = %self.inner.user,
                    slot = index,
                    error = %err,
                    "click handler failed"
                );
            }
        }
        event.cancel();
    }

    /// Cancel the whole drag if it touches any cell of this surface.
    pub fn handle_drag(&self, event: &mut DragEvent) {
        if event
            .raw_slots
            .iter()
            .any(|&slot| self.slot_index(slot).is_some())
        {
            event.cancel();
        }
    }

    /// Start ticking animated buttons every `interval` ticks, replacing any
    /// running animation. Ignored once closed.
    pub fn start_animation(&self, interval: u64) {
        if self.is_closed() {
            return;
        }
        self.stop_animation();

        let weak = Arc::downgrade(&self.inner);
        let handle = self.inner.host.run_repeating(
            0,
            interval.max(1),
            Box::new(move || match weak.upgrade() {
                Some(inner) => Session { inner }.animation_tick(),
                None => Repeat::Stop,
            }),
        );

        let mut state = lock(&self.inner.state);
        if state.closed {
            drop(state);
            self.inner.host.cancel(handle);
            return;
        }
        if let Some(stale) = state.animation.replace(handle) {
            drop(state);
            self.inner.host.cancel(stale);
        }
    }

    /// Start animating at the template's fastest button speed, or the
    /// configured default when no button declares one.
    pub fn start_default_animation(&self) {
        let interval = self
            .inner
            .template
            .animation_interval()
            .unwrap_or(self.inner.default_animation_interval);
        self.start_animation(interval);
    }

    pub fn stop_animation(&self) {
        let handle = lock(&self.inner.state).animation.take();
        if let Some(handle) = handle {
            self.inner.host.cancel(handle);
        }
    }

    fn animation_tick(&self) -> Repeat {
        if self.is_closed() {
            return Repeat::Stop;
        }
        for button in self.inner.template.buttons().values() {
            button.advance_frame();
        }
        self.render();
        Repeat::Continue
    }

    /// Close the session. Idempotent.
    ///
    /// The closed flag is set before any side effect, so renders and clicks
    /// racing with the close see a closed session. On the next tick the
    /// surface is hidden if it is still on top, then released to the host.
    pub fn close(&self) {
        let animation = {
            let mut state = lock(&self.inner.state);
            if state.closed {
                return;
            }
            state.closed = true;
            state.animation.take()
        };
        if let Some(handle) = animation {
            self.inner.host.cancel(handle);
        }

        debug!(
            template = %self.inner.template.id(),
            user = %self.inner.user,
            session = %self.inner.id,
            "menu session closed"
        );

        if let Some(handler) = self.inner.template.close_handler() {
            self.invoke(handler, "close");
        }

        let user = self.inner.user;
        let surface = self.inner.surface;
        let host = Arc::clone(&self.inner.host);
        self.inner.host.run_next_tick(Box::new(move || {
            if host.current_top_surface(user) == Some(surface) {
                host.hide(user);
            }
            host.release(surface);
        }));
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("user", &self.inner.user)
            .field("template", &self.inner.template.id())
            .field("surface", &self.inner.surface)
            .field("closed", &self.is_closed())
            .finish()
    }
}
