use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct MenuRects {
    pub top: Rect,
    pub grid: Rect,
    pub help: Rect,
    pub logs: Rect,
}

/// Split the screen into a title bar, the grid with a help column beside
/// it, and a log panel along the bottom.
pub fn menu_layout(area: Rect, log_height: u16, help_width: u16) -> MenuRects {
    let log_height = log_height.max(3).min(area.height.saturating_sub(4).max(3));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(log_height),
        ])
        .split(area);

    let help_width = help_width.min(rows[1].width / 2);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(help_width)])
        .split(rows[1]);

    MenuRects {
        top: rows[0],
        grid: cols[0],
        help: cols[1],
        logs: rows[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_tile_the_screen() {
        let area = Rect::new(0, 0, 100, 40);
        let rects = menu_layout(area, 8, 24);
        assert_eq!(rects.top.height, 1);
        assert_eq!(rects.logs.height, 8);
        assert_eq!(rects.grid.height, 31);
        assert_eq!(rects.help.width, 24);
        assert_eq!(rects.grid.width + rects.help.width, 100);
    }

    #[test]
    fn log_panel_shrinks_on_small_screens() {
        let rects = menu_layout(Rect::new(0, 0, 40, 10), 20, 30);
        assert_eq!(rects.logs.height, 6);
        assert!(rects.help.width <= 20);
    }
}
