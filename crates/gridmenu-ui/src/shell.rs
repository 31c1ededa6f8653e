use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::layout::MenuRects;

/// Chrome around the grid: a title bar and the key help column.
pub struct ShellView<'a> {
    pub menu_title: &'a str,
    pub status_line: &'a str,
    pub help: &'a [(&'a str, &'a str)],
}

pub fn render_shell(
    f: &mut Frame,
    rects: MenuRects,
    view: ShellView<'_>,
    grid: impl FnOnce(&mut Frame, Rect),
) {
    let top = Line::from(vec![
        Span::styled(
            " GRIDMENU ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} | {}", view.menu_title, view.status_line)),
    ]);
    f.render_widget(Paragraph::new(top), rects.top);

    grid(f, rects.grid);

    let help = Text::from(
        view.help
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(format!("{key:>6} "), Style::default().fg(Color::Yellow)),
                    Span::raw(*action),
                ])
            })
            .collect::<Vec<_>>(),
    );
    f.render_widget(
        Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("KEYS")),
        rects.help,
    );
}
