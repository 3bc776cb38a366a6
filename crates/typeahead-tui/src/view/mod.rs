pub mod extracts;
pub mod search;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use serde_json::Value;
use typeahead_core::Item;

use crate::app::{App, ListGeometry};

/// Spinner frames for animated progress indication.
const SPINNER_FRAMES: &[char] = &[
    '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
    '\u{2807}', '\u{280F}',
];

/// Get the current spinner character based on a tick counter.
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Truncate a string to fit in `max_width` columns, appending "\u{2026}" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('\u{2026}');
    truncated
}

/// Display text for a result: the listed fields that hold a string or
/// number, space-separated. Falls back to the compact JSON of the record.
pub fn item_label(item: &Item, fields: &[String]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|name| match item.field(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        match item.value() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    } else {
        parts.join(" ")
    }
}

/// Draw the whole screen; returns where the result list landed.
pub fn render(f: &mut Frame, app: &App) -> Option<ListGeometry> {
    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Length(3), // query input
        Constraint::Length(1), // status
        Constraint::Min(4),    // results
        Constraint::Length(8), // extracts
        Constraint::Length(1), // footer
    ])
    .split(f.area());

    let header = Line::from(vec![
        Span::styled(" Disaster Search ", app.theme.header_style()),
        Span::styled(
            format!(" via {}", app.engine.backend_name()),
            ratatui::style::Style::default().fg(app.theme.dim),
        ),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    search::render_input(f, app, chunks[1]);
    search::render_status(f, app, chunks[2]);
    let geometry = search::render_results(f, app, chunks[3]);
    extracts::render(f, app, chunks[4]);

    let footer = Line::from(Span::styled(
        " \u{2191}/\u{2193} select  Enter add  Esc clear  Ctrl+R retry  Ctrl+D remove last  Ctrl+C quit",
        app.theme.footer_style(),
    ));
    f.render_widget(Paragraph::new(footer), chunks[5]);

    geometry
}
