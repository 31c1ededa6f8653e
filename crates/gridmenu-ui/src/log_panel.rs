use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use gridmenu_core::logging::{LogEntry, LogLevel};

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug => Color::Cyan,
        LogLevel::Trace => Color::DarkGray,
    }
}

/// The newest entries that fit in `height` rows, oldest first.
pub fn log_lines(entries: &[LogEntry], height: usize) -> Vec<Line<'_>> {
    let start = entries.len().saturating_sub(height);
    entries[start..]
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{:5} ", entry.level),
                    Style::default()
                        .fg(level_color(entry.level))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("[{}] ", entry.target),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(entry.message.as_str()),
            ])
        })
        .collect()
}

/// Bordered panel showing the tail of the log buffer.
pub fn render_log_panel(f: &mut Frame, area: Rect, entries: &[LogEntry]) {
    let block = Block::default().borders(Borders::ALL).title("LOG");
    let visible = usize::from(block.inner(area).height);
    f.render_widget(Paragraph::new(log_lines(entries, visible)).block(block), area);
}
