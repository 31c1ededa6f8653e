use std::collections::HashMap;

use crate::host::{SurfaceId, Surfaces};
use crate::item::Item;

/// A static fill rule: rows of layout symbols plus a symbol → item map.
///
/// ```
/// use gridmenu_core::{Item, Pattern};
///
/// let border = Pattern::new(["#########", "#       #", "#########"])
///     .glyph('#', Item::new("gray_pane"));
/// assert_eq!(border.stamps(9, 27).count(), 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    rows: Vec<String>,
    glyphs: HashMap<char, Item>,
}

impl Pattern {
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            glyphs: HashMap::new(),
        }
    }

    /// Map `symbol` to an item prototype. Later calls for the same symbol win.
    pub fn glyph(mut self, symbol: char, item: impl Into<Item>) -> Self {
        self.glyphs.insert(symbol, item.into());
        self
    }

    /// Cells this pattern writes on a grid `width` cells wide holding `size`
    /// cells, in row-major order. Columns past `width` and indices past
    /// `size` are skipped, as are symbols without a glyph.
    pub fn stamps(&self, width: usize, size: usize) -> impl Iterator<Item = (usize, Item)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(row, line)| {
            line.chars()
                .take(width)
                .enumerate()
                .filter_map(move |(col, symbol)| {
                    let item = self.glyphs.get(&symbol)?;
                    let index = row * width + col;
                    (index < size).then(|| (index, item.clone()))
                })
        })
    }

    /// Stamp fresh clones of the glyphs onto `surface`.
    pub fn apply<S: Surfaces + ?Sized>(&self, surfaces: &S, surface: SurfaceId, width: usize) {
        let size = surfaces.size(surface);
        for (index, item) in self.stamps(width, size) {
            surfaces.set_cell(surface, index, Some(item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SessionId, SurfaceKind, SurfaceSpec};
    use crate::memory::MemoryHost;

    fn chest(host: &MemoryHost, rows: usize) -> SurfaceId {
        let spec = SurfaceSpec {
            kind: SurfaceKind::Chest,
            size: rows * 9,
        };
        host.create(SessionId(1), spec, "test")
    }

    #[test]
    fn stamps_matching_symbols_only() {
        let pattern = Pattern::new(["X.X"]).glyph('X', "stone");
        let stamps: Vec<usize> = pattern.stamps(9, 27).map(|(i, _)| i).collect();
        assert_eq!(stamps, vec![0, 2]);
    }

    #[test]
    fn second_row_offsets_by_width() {
        let pattern = Pattern::new(["", "  X"]).glyph('X', "stone");
        let stamps: Vec<usize> = pattern.stamps(9, 27).map(|(i, _)| i).collect();
        assert_eq!(stamps, vec![11]);
    }

    #[test]
    fn never_stamps_past_surface_size() {
        let pattern = Pattern::new(["XXXXXXXXX", "XXXXXXXXX", "XXXXXXXXX", "XXXXXXXXX"])
            .glyph('X', "stone");
        let indices: Vec<usize> = pattern.stamps(9, 18).map(|(i, _)| i).collect();
        assert_eq!(indices.len(), 18);
        assert!(indices.iter().all(|&i| i < 18));
    }

    #[test]
    fn overlong_rows_do_not_wrap() {
        let pattern = Pattern::new(["XXXXXXXXXXXX"]).glyph('X', "stone");
        let indices: Vec<usize> = pattern.stamps(9, 27).map(|(i, _)| i).collect();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn apply_writes_clones_onto_surface() {
        let host = MemoryHost::new();
        let surface = chest(&host, 1);
        let item = Item::new("glass").with_label("Frame");
        Pattern::new(["X   X"]).glyph('X', item.clone()).apply(&host, surface, 9);

        assert_eq!(host.cell(surface, 0), Some(item.clone()));
        assert_eq!(host.cell(surface, 4), Some(item));
        assert_eq!(host.cell(surface, 1), None);
    }

    #[test]
    fn apply_on_small_surface_ignores_overflow() {
        let host = MemoryHost::new();
        let surface = chest(&host, 1);
        Pattern::new(["", "XXXXXXXXX"]).glyph('X', "stone").apply(&host, surface, 9);
        assert!(host.cells(surface).iter().all(Option::is_none));
    }
}
