use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::button::Button;
use crate::error::{MenuError, Result};
use crate::host::{SurfaceKind, SurfaceSpec, ROW_WIDTH};
use crate::pattern::Pattern;
use crate::session::Session;

/// Callback run with a session on render (update) or on close.
pub type SessionHandler = Arc<dyn Fn(&Session) -> anyhow::Result<()> + Send + Sync>;

/// Largest row count accepted by [`Template::chest`].
pub const MAX_CHEST_ROWS: usize = 6;

/// A reusable menu definition.
///
/// Configure a template with the consuming `with_*`/`on_*` methods, then
/// publish it through [`crate::registry::MenuRegistry::register`]. Once
/// published it is shared read-only by every session that opens it.
///
/// ```
/// use std::time::Duration;
/// use gridmenu_core::{Button, Item, Pattern, Template};
///
/// let template = Template::chest("main", "Main menu", 3)
///     .unwrap()
///     .with_pattern(Pattern::new(["XXXXXXXXX"]).glyph('X', "gray_pane"))
///     .with_button(
///         13,
///         Button::new(Item::new("emerald").with_label("Buy"))
///             .click_cooldown(Duration::from_millis(500)),
///     );
/// assert_eq!(template.size(), 27);
/// assert!(template.button_at(13).is_some());
/// ```
pub struct Template {
    id: String,
    title: String,
    kind: SurfaceKind,
    size: Option<usize>,
    patterns: Vec<Pattern>,
    buttons: BTreeMap<usize, Button>,
    on_update: Option<SessionHandler>,
    on_close: Option<SessionHandler>,
}

impl Template {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: SurfaceKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            size: None,
            patterns: Vec::new(),
            buttons: BTreeMap::new(),
            on_update: None,
            on_close: None,
        }
    }

    /// A chest template of `rows` full rows (1 to [`MAX_CHEST_ROWS`]).
    pub fn chest(id: impl Into<String>, title: impl Into<String>, rows: usize) -> Result<Self> {
        if !(1..=MAX_CHEST_ROWS).contains(&rows) {
            return Err(MenuError::InvalidArgument(format!(
                "rows must be between 1 and {MAX_CHEST_ROWS}, got {rows}"
            )));
        }
        Self::new(id, title, SurfaceKind::Chest).with_size(rows * ROW_WIDTH)
    }

    /// Set a custom cell count. Only caller-sized kinds accept a nonzero
    /// size, and it must be a multiple of 9. Zero resets to the kind's
    /// intrinsic size.
    pub fn with_size(mut self, size: usize) -> Result<Self> {
        if size != 0 && !self.kind.supports_custom_size() {
            return Err(MenuError::InvalidArgument(format!(
                "size can only be set for chest templates, not {:?}",
                self.kind
            )));
        }
        if size % ROW_WIDTH != 0 {
            return Err(MenuError::InvalidArgument(format!(
                "size must be a multiple of {ROW_WIDTH}, got {size}"
            )));
        }
        self.size = (size != 0).then_some(size);
        Ok(self)
    }

    /// Bind `button` to cell `index`, replacing any previous binding.
    pub fn with_button(mut self, index: usize, button: Button) -> Self {
        self.buttons.insert(index, button);
        self
    }

    /// Append a pattern. Patterns are stamped in the order they were added.
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn on_update<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Session) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(handler));
        self
    }

    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Session) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(handler));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// The size set with [`with_size`](Self::with_size), if any.
    pub fn custom_size(&self) -> Option<usize> {
        self.size
    }

    /// Effective cell count.
    pub fn size(&self) -> usize {
        self.size.unwrap_or_else(|| self.kind.intrinsic_size())
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }

    pub fn surface_spec(&self) -> SurfaceSpec {
        SurfaceSpec {
            kind: self.kind,
            size: self.size(),
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Buttons in ascending cell order.
    pub fn buttons(&self) -> &BTreeMap<usize, Button> {
        &self.buttons
    }

    pub fn button_at(&self, index: usize) -> Option<&Button> {
        self.buttons.get(&index)
    }

    pub fn update_handler(&self) -> Option<&SessionHandler> {
        self.on_update.as_ref()
    }

    pub fn close_handler(&self) -> Option<&SessionHandler> {
        self.on_close.as_ref()
    }

    /// Smallest animation speed among animated buttons.
    pub fn animation_interval(&self) -> Option<u64> {
        self.buttons
            .values()
            .filter_map(Button::animation_speed)
            .min()
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("size", &self.size())
            .field("patterns", &self.patterns.len())
            .field("buttons", &self.buttons)
            .field("has_update_handler", &self.on_update.is_some())
            .field("has_close_handler", &self.on_close.is_some())
            .finish()
    }
}
