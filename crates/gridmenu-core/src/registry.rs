use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

use gridmenu_config::MenuConfig;
use tracing::debug;

use crate::error::{MenuError, Result};
use crate::event::{ClickEvent, CloseEvent, DragEvent, HostEvent};
use crate::host::{Host, SurfaceId, SurfaceKind, UserId};
use crate::session::{Session, SessionData};
use crate::template::Template;
use crate::{lock, read, write};

/// Owns the template table and the active sessions, and routes host
/// notifications to the session they belong to.
///
/// Each user has at most one open session. The handle is cheap to clone;
/// clones share the same tables. No table lock is held while templates'
/// handlers run, so handlers may call back into the registry.
#[derive(Clone)]
pub struct MenuRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    host: Arc<dyn Host>,
    config: MenuConfig,
    templates: RwLock<HashMap<String, Arc<Template>>>,
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl MenuRegistry {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_config(host, MenuConfig::default())
    }

    pub fn with_config(host: Arc<dyn Host>, config: MenuConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                host,
                config,
                templates: RwLock::new(HashMap::new()),
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Publish a template under its id, replacing any previous one.
    /// Sessions already open keep the template they were opened with.
    pub fn register(&self, template: Template) -> Arc<Template> {
        let template = Arc::new(template);
        let replaced = write(&self.inner.templates)
            .insert(template.id().to_string(), Arc::clone(&template))
            .is_some();
        debug!(template = %template.id(), replaced, "template registered");
        template
    }

    /// Build a template with `configure` and register it.
    pub fn create_template<F>(
        &self,
        id: &str,
        title: &str,
        kind: SurfaceKind,
        configure: F,
    ) -> Result<Arc<Template>>
    where
        F: FnOnce(Template) -> Result<Template>,
    {
        let template = configure(Template::new(id, title, kind))?;
        Ok(self.register(template))
    }

    /// Build a chest template of `rows` rows with `configure` and register it.
    pub fn create_chest_template<F>(
        &self,
        id: &str,
        title: &str,
        rows: usize,
        configure: F,
    ) -> Result<Arc<Template>>
    where
        F: FnOnce(Template) -> Result<Template>,
    {
        let template = configure(Template::chest(id, title, rows)?)?;
        Ok(self.register(template))
    }

    pub fn template(&self, id: &str) -> Option<Arc<Template>> {
        read(&self.inner.templates).get(id).cloned()
    }

    /// Registered template ids, sorted.
    pub fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.inner.templates).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Open `template_id` for `user`, closing any menu they already have.
    pub fn open(&self, user: UserId, template_id: &str, data: SessionData) -> Result<Session> {
        let template = self
            .template(template_id)
            .ok_or_else(|| MenuError::NotFound(template_id.to_string()))?;

        self.close(user);

        let session = Session::new(
            user,
            template,
            data,
            Arc::clone(&self.inner.host),
            &self.inner.config,
        );
        let displaced = lock(&self.inner.sessions).insert(user, session.clone());
        if let Some(displaced) = displaced {
            // A close handler opened another menu for this user in between.
            displaced.close();
        }

        debug!(
            template = %template_id,
            user = %user,
            session = %session.id(),
            "menu session opened"
        );
        session.render();
        Ok(session)
    }

    /// Close the user's menu, if any.
    pub fn close(&self, user: UserId) {
        let session = lock(&self.inner.sessions).remove(&user);
        if let Some(session) = session {
            session.close();
        }
    }

    pub fn session(&self, user: UserId) -> Option<Session> {
        lock(&self.inner.sessions).get(&user).cloned()
    }

    /// Number of users with an open menu.
    pub fn active_sessions(&self) -> usize {
        lock(&self.inner.sessions).len()
    }

    /// The user's session, but only if it owns `surface`.
    fn owning_session(&self, user: UserId, surface: SurfaceId) -> Option<Session> {
        self.session(user)
            .filter(|session| session.owns(surface))
    }

    /// Route any host notification.
    pub fn dispatch(&self, event: &mut HostEvent) {
        match event {
            HostEvent::Click(ev) => self.on_click(ev),
            HostEvent::Drag(ev) => self.on_drag(ev),
            HostEvent::Close(ev) => self.on_close(ev),
        }
    }

    pub fn on_click(&self, event: &mut ClickEvent) {
        if let Some(session) = self.owning_session(event.user, event.surface) {
            session.handle_click(event);
        }
    }

    pub fn on_drag(&self, event: &mut DragEvent) {
        if let Some(session) = self.owning_session(event.user, event.surface) {
            session.handle_drag(event);
        }
    }

    /// Reconcile a host-originated close.
    ///
    /// Hosts emit a close for the old surface right before showing a new
    /// one, so the decision is deferred by `scheduler.close_recheck_delay_ticks`.
    /// If the user's top surface is then still not this session's, the
    /// session is dropped from the table and closed.
    pub fn on_close(&self, event: &CloseEvent) {
        let Some(session) = self.owning_session(event.user, event.surface) else {
            return;
        };

        let user = event.user;
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        self.inner.host.run_later(
            self.inner.config.scheduler.close_recheck_delay_ticks,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    MenuRegistry { inner }.reconcile_close(user, &session);
                }
            }),
        );
    }

    fn reconcile_close(&self, user: UserId, session: &Session) {
        let still_shown = self
            .inner
            .host
            .current_top_surface(user)
            .is_some_and(|top| session.owns(top));
        if still_shown {
            debug!(user = %user, session = %session.id(), "close superseded by re-show");
            return;
        }

        {
            let mut sessions = lock(&self.inner.sessions);
            if sessions
                .get(&user)
                .is_some_and(|current| current.ptr_eq(session))
            {
                sessions.remove(&user);
            }
        }
        session.close();
    }
}
