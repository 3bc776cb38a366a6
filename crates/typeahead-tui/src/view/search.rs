use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use typeahead_core::SelectionState;

use crate::app::{App, ListGeometry, StatusLine};
use crate::view::{item_label, spinner_char, truncate};

/// Query input box, with a spinner while a lookup is outstanding.
pub fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let min_chars = app.engine.config().min_chars;
    let query = app.engine.query();

    let mut spans = vec![Span::styled(
        format!("{query}\u{2588}"),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    )];
    if app.engine.is_loading() {
        spans.push(Span::styled(
            format!(" {}", spinner_char(app.tick)),
            Style::default().fg(theme.spinner),
        ));
    } else if app.engine.is_dirty() && query.chars().count() < min_chars {
        spans.push(Span::styled(
            format!("  type at least {min_chars} characters"),
            Style::default().fg(theme.dim),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Search by disaster number or place ");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

pub fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(StatusLine::Info(msg)) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(app.theme.dim),
        )),
        Some(StatusLine::Error(msg)) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(app.theme.error),
        )),
        None => Line::default(),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Suggestion list. Scrolls to keep the selection visible.
pub fn render_results(f: &mut Frame, app: &App, area: Rect) -> Option<ListGeometry> {
    let theme = &app.theme;
    let items = app.engine.items();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" Results ({}) ", items.len()));
    let inner = block.inner(area);
    let visible = inner.height as usize;

    let selected = match app.engine.selection() {
        SelectionState::Selected(i) => Some(i),
        SelectionState::Empty | SelectionState::Unselected => None,
    };
    let previous = app.list_geometry.map(|g| g.offset).unwrap_or(0);
    let offset = scroll_offset(previous, selected, visible, items.len());

    let width = inner.width.saturating_sub(2) as usize;
    let rows: Vec<ListItem> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, item)| {
            let label = truncate(&item_label(item, &app.label_fields), width);
            if Some(i) == selected {
                ListItem::new(Line::from(Span::styled(
                    format!("\u{25B8} {label}"),
                    theme.highlight_style().fg(theme.active),
                )))
            } else {
                ListItem::new(Line::from(Span::styled(
                    format!("  {label}"),
                    Style::default().fg(theme.text),
                )))
            }
        })
        .collect();

    f.render_widget(List::new(rows).block(block), area);
    Some(ListGeometry { inner, offset })
}

/// First visible row for a list of `len` rows showing `visible` at a time.
///
/// The previous offset is kept unless the selection would fall outside the
/// window, in which case the window moves just far enough to show it.
pub fn scroll_offset(previous: usize, selected: Option<usize>, visible: usize, len: usize) -> usize {
    if visible == 0 {
        return 0;
    }
    let mut offset = previous.min(len.saturating_sub(visible));
    if let Some(i) = selected {
        if i < offset {
            offset = i;
        } else if i >= offset + visible {
            offset = i + 1 - visible;
        }
    }
    offset
}
