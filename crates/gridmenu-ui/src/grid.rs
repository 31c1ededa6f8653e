use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthChar;

use gridmenu_core::Item;

/// Terminal columns per grid cell, brackets included.
pub const CELL_WIDTH: u16 = 12;
const EMPTY_CELL: &str = "·";

/// Draws one menu surface as rows of bracketed cells, `width` cells per row.
pub struct GridView<'a> {
    pub title: &'a str,
    pub cells: &'a [Option<Item>],
    pub width: usize,
    pub cursor: Option<usize>,
}

impl GridView<'_> {
    /// Where cell `index` is drawn inside `inner`, if it fits.
    fn cell_rect(&self, inner: Rect, index: usize) -> Option<Rect> {
        let width = self.width.max(1);
        let col = u16::try_from(index % width).ok()?;
        let row = u16::try_from(index / width).ok()?;
        let x = col.checked_mul(CELL_WIDTH)?;
        let y = row.checked_mul(2)?;
        if x + CELL_WIDTH > inner.width || y >= inner.height {
            return None;
        }
        Some(Rect::new(inner.x + x, inner.y + y, CELL_WIDTH, 1))
    }
}

impl Widget for GridView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        for (index, cell) in self.cells.iter().enumerate() {
            let Some(rect) = self.cell_rect(inner, index) else {
                continue;
            };
            let text = cell.as_ref().map_or_else(|| EMPTY_CELL.to_string(), cell_text);
            let label = fit_label(&text, usize::from(CELL_WIDTH - 2));

            let mut style = match cell {
                Some(_) => Style::default().fg(Color::White),
                None => Style::default().fg(Color::DarkGray),
            };
            if self.cursor == Some(index) {
                style = style.bg(Color::Yellow).fg(Color::Black).add_modifier(Modifier::BOLD);
            }
            buf.set_string(rect.x, rect.y, format!("[{label:<w$}]", w = label_pad(&label)), style);
        }
    }
}

/// Cell caption: display name plus a stack count above one.
pub fn cell_text(item: &Item) -> String {
    if item.amount > 1 {
        format!("{} x{}", item.display_name(), item.amount)
    } else {
        item.display_name().to_string()
    }
}

/// Truncate `text` to at most `max_width` terminal columns, ending in `…`
/// when anything was cut.
pub fn fit_label(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            while used + 1 > max_width {
                let Some(last) = out.pop() else { break };
                used -= last.width().unwrap_or(0);
            }
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Character padding that makes `label` fill the cell interior, since
/// `format!` pads by chars rather than columns.
fn label_pad(label: &str) -> usize {
    let columns: usize = label.chars().map(|c| c.width().unwrap_or(0)).sum();
    let chars = label.chars().count();
    chars + usize::from(CELL_WIDTH - 2).saturating_sub(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map_or(" ", |c| c.symbol()).to_string())
            .collect()
    }

    #[test]
    fn fit_label_keeps_short_text() {
        assert_eq!(fit_label("stone", 10), "stone");
        assert_eq!(fit_label("", 3), "");
    }

    #[test]
    fn fit_label_truncates_with_ellipsis() {
        assert_eq!(fit_label("diamond_sword", 6), "diamo…");
    }

    #[test]
    fn fit_label_counts_wide_chars() {
        // Each CJK char takes two columns.
        assert_eq!(fit_label("宝石宝石", 5), "宝石…");
    }

    #[test]
    fn cell_text_shows_stack_size() {
        assert_eq!(cell_text(&Item::new("emerald").with_amount(3)), "emerald x3");
        assert_eq!(cell_text(&Item::new("emerald").with_label("Gem")), "Gem");
    }

    #[test]
    fn grid_draws_cells_row_by_row() {
        let cells = vec![Some(Item::new("a")), None, Some(Item::new("b")), None];
        let area = Rect::new(0, 0, CELL_WIDTH * 2 + 2, 6);
        let mut buf = Buffer::empty(area);
        GridView {
            title: "Menu",
            cells: &cells,
            width: 2,
            cursor: Some(1),
        }
        .render(area, &mut buf);

        assert!(row_text(&buf, 1).starts_with("│[a         ][·         ]"));
        assert!(row_text(&buf, 3).starts_with("│[b         ][·         ]"));
        let cursor = buf.cell((1 + CELL_WIDTH, 1)).unwrap();
        assert_eq!(cursor.bg, Color::Yellow);
    }

    #[test]
    fn cells_outside_the_area_are_skipped() {
        let cells = vec![Some(Item::new("a")); 9];
        let area = Rect::new(0, 0, CELL_WIDTH + 2, 3);
        let mut buf = Buffer::empty(area);
        GridView {
            title: "",
            cells: &cells,
            width: 9,
            cursor: None,
        }
        .render(area, &mut buf);
        assert!(row_text(&buf, 1).starts_with("│[a"));
    }
}
