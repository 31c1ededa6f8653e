use std::io::{self, Stdout};
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use gridmenu_config::MenuConfig;
use gridmenu_core::{
    logging::{self, LogBuffer, LogEntry},
    ClickEvent, ClickKind, DragEvent, MemoryHost, MenuRegistry, Surfaces, UserId, ROW_WIDTH,
};
use gridmenu_ui::{
    grid::GridView,
    layout::menu_layout,
    log_panel::render_log_panel,
    shell::{render_shell, ShellView},
};

mod menus;

/// The single local user driving the terminal.
const PLAYER: UserId = UserId(1);

const HELP: [(&str, &str); 8] = [
    ("arrows", "move"),
    ("enter", "left click"),
    ("r", "right click"),
    ("s", "shift click"),
    ("d", "drag right"),
    ("esc", "close menu"),
    ("m", "open main"),
    ("q", "quit"),
];

struct App {
    host: Arc<MemoryHost>,
    menus: MenuRegistry,
    log_buffer: LogBuffer,
    cursor: usize,
    status_line: String,
}

impl App {
    fn new(log_buffer: LogBuffer) -> Result<Self> {
        let config = MenuConfig::from_env("GRIDMENU_CONFIG")?;
        let host = Arc::new(MemoryHost::new());
        let menus = MenuRegistry::with_config(host.clone(), config);
        menus::register(&menus).context("failed to register demo menus")?;
        menus::open_main(&menus, PLAYER, menus::starting_data())?;

        Ok(Self {
            host,
            menus,
            log_buffer,
            cursor: 0,
            status_line: "ready".to_string(),
        })
    }

    fn log_tail(&self) -> Vec<LogEntry> {
        let buffer = self.log_buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.iter().cloned().collect()
    }

    /// Advance the scheduler one tick and route what the host emitted.
    fn tick(&mut self) {
        self.host.tick();
        self.pump_host_events();
    }

    fn pump_host_events(&mut self) {
        for mut event in self.host.drain_events() {
            self.menus.dispatch(&mut event);
        }
    }

    /// Geometry of the surface on top, as (columns, cells).
    fn top_geometry(&self) -> Option<(usize, usize)> {
        let surface = self.host.current_top_surface(PLAYER)?;
        let width = self.host.kind(surface).map_or(ROW_WIDTH, |kind| kind.width());
        Some((width, self.host.size(surface)))
    }

    fn click(&mut self, kind: ClickKind) {
        let Some(surface) = self.host.current_top_surface(PLAYER) else {
            return;
        };
        let Ok(slot) = i32::try_from(self.cursor) else {
            return;
        };

        let mut event = ClickEvent::new(PLAYER, surface, slot, Instant::now()).with_kind(kind);
        self.menus.on_click(&mut event);

        self.status_line = if event.is_cancelled() {
            format!("{kind:?} click on slot {slot} handled")
        } else {
            match self.host.take_cell(surface, self.cursor) {
                Some(item) => format!("picked up {}", item.display_name()),
                None => format!("slot {slot} is empty"),
            }
        };
        self.pump_host_events();
    }

    fn drag(&mut self) {
        let Some(surface) = self.host.current_top_surface(PLAYER) else {
            return;
        };
        let slots: Vec<i32> = [self.cursor, self.cursor + 1]
            .into_iter()
            .filter_map(|slot| i32::try_from(slot).ok())
            .collect();

        let mut event = DragEvent::new(PLAYER, surface, slots);
        self.menus.on_drag(&mut event);
        self.status_line = if event.is_cancelled() {
            "drag blocked by menu".to_string()
        } else {
            "drag allowed".to_string()
        };
    }

    /// Handle one key press. Returns `true` to quit.
    fn on_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some((width, size)) = self.top_geometry() {
            if let Some(cursor) = move_cursor(self.cursor, key.code, width, size) {
                self.cursor = cursor;
                return Ok(false);
            }
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.click(ClickKind::ShiftLeft)
            }
            KeyCode::Enter => self.click(ClickKind::Left),
            KeyCode::Char('r') => self.click(ClickKind::Right),
            KeyCode::Char('s') => self.click(ClickKind::ShiftLeft),
            KeyCode::Char('d') => self.drag(),
            KeyCode::Esc => {
                self.host.user_close(PLAYER);
                self.pump_host_events();
                self.status_line = "menu dismissed".to_string();
            }
            KeyCode::Char('m') => {
                menus::open_main(&self.menus, PLAYER, menus::starting_data())?;
                self.cursor = 0;
                self.status_line = "main menu opened".to_string();
            }
            _ => {}
        }
        Ok(false)
    }
}

/// New cursor position for an arrow key on a `width`-column grid of `size`
/// cells, or `None` if `key` is not an arrow.
fn move_cursor(cursor: usize, key: KeyCode, width: usize, size: usize) -> Option<usize> {
    let width = width.max(1);
    let last = size.saturating_sub(1);
    let cursor = cursor.min(last);
    let next = match key {
        KeyCode::Left if cursor % width > 0 => cursor - 1,
        KeyCode::Right if cursor % width + 1 < width && cursor < last => cursor + 1,
        KeyCode::Up if cursor >= width => cursor - width,
        KeyCode::Down if cursor + width <= last => cursor + width,
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => cursor,
        _ => return None,
    };
    Some(next)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let log_buffer = logging::init();
    tracing::info!("gridmenu starting up");

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, log_buffer);
    restore_terminal(terminal)?;
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, log_buffer: LogBuffer) -> Result<()> {
    let mut app = App::new(log_buffer)?;
    // 20 ticks per second.
    let tick_interval = Duration::from_millis(50);
    let poll_timeout = Duration::from_millis(16);
    let mut last_tick = Instant::now();

    loop {
        let logs = app.log_tail();
        let top = app.host.current_top_surface(PLAYER);
        let title = top.and_then(|surface| app.host.title(surface));
        let cells = top.map(|surface| app.host.cells(surface)).unwrap_or_default();
        let width = app.top_geometry().map_or(ROW_WIDTH, |(width, _)| width);
        let status = format!(
            "tick {} | {} open | {}",
            app.host.current_tick(),
            app.menus.active_sessions(),
            app.status_line
        );

        terminal.draw(|f| {
            let rects = menu_layout(f.area(), 8, 24);
            let view = ShellView {
                menu_title: title.as_deref().unwrap_or("no menu"),
                status_line: &status,
                help: &HELP,
            };
            render_shell(f, rects, view, |f, area| match title.as_deref() {
                Some(title) => f.render_widget(
                    GridView {
                        title,
                        cells: &cells,
                        width,
                        cursor: Some(app.cursor),
                    },
                    area,
                ),
                None => f.render_widget(
                    Paragraph::new("No menu open. Press m to open the main menu.")
                        .block(Block::default().borders(Borders::ALL)),
                    area,
                ),
            });
            render_log_panel(f, rects.logs, &logs);
        })?;

        if event::poll(poll_timeout)? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.on_key(key)? {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_interval {
            last_tick = Instant::now();
            app.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_stay_inside_the_grid() {
        assert_eq!(move_cursor(0, KeyCode::Left, 9, 27), Some(0));
        assert_eq!(move_cursor(0, KeyCode::Up, 9, 27), Some(0));
        assert_eq!(move_cursor(8, KeyCode::Right, 9, 27), Some(8));
        assert_eq!(move_cursor(20, KeyCode::Down, 9, 27), Some(20));
        assert_eq!(move_cursor(4, KeyCode::Down, 9, 27), Some(13));
        assert_eq!(move_cursor(13, KeyCode::Up, 9, 27), Some(4));
    }

    #[test]
    fn narrow_surfaces_wrap_at_their_width() {
        assert_eq!(move_cursor(2, KeyCode::Right, 3, 9), Some(2));
        assert_eq!(move_cursor(2, KeyCode::Down, 3, 9), Some(5));
        assert_eq!(move_cursor(4, KeyCode::Right, 5, 5), Some(4));
    }

    #[test]
    fn stale_cursor_is_clamped() {
        assert_eq!(move_cursor(30, KeyCode::Left, 5, 5), Some(3));
    }

    #[test]
    fn other_keys_are_not_movement() {
        assert_eq!(move_cursor(0, KeyCode::Enter, 9, 27), None);
        assert_eq!(move_cursor(0, KeyCode::Char('q'), 9, 27), None);
    }

    #[test]
    fn esc_right_before_an_animation_tick_still_closes() {
        let mut app = App::new(logging::new_log_buffer(16)).unwrap();
        // The main menu animates every 10 ticks starting at tick 1.
        while app.host.current_tick() < 10 {
            app.tick();
        }

        app.on_key(KeyEvent::from(KeyCode::Esc)).unwrap();
        for _ in 0..3 {
            app.tick();
        }
        assert_eq!(app.menus.active_sessions(), 0);
        assert_eq!(app.host.current_top_surface(PLAYER), None);
    }

    #[test]
    fn app_opens_main_menu_and_handles_clicks() {
        let mut app = App::new(logging::new_log_buffer(16)).unwrap();
        app.tick();
        assert_eq!(app.top_geometry(), Some((9, 27)));

        app.cursor = 10;
        app.click(ClickKind::Left);
        assert!(app.status_line.contains("handled"));

        app.cursor = 0;
        app.click(ClickKind::Left);
        assert_eq!(app.status_line, "picked up ░░░░");

        app.on_key(KeyEvent::from(KeyCode::Esc)).unwrap();
        app.tick();
        app.tick();
        assert_eq!(app.top_geometry(), None);
        assert_eq!(app.menus.active_sessions(), 0);
    }
}
