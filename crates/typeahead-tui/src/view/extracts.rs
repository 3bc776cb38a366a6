use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::app::App;
use crate::view::{item_label, truncate};

/// Chosen items, newest at the bottom.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" Extracts ({}) ", app.extracts.len()));
    let inner = block.inner(area);
    let visible = inner.height as usize;
    let width = inner.width.saturating_sub(4) as usize;

    let skip = app.extracts.len().saturating_sub(visible);
    let rows: Vec<ListItem> = app
        .extracts
        .iter()
        .skip(skip)
        .map(|item| {
            ListItem::new(Line::from(vec![
                Span::styled(" \u{2713} ", Style::default().fg(theme.chosen)),
                Span::styled(
                    truncate(&item_label(item, &app.label_fields), width),
                    Style::default().fg(theme.text),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(rows).block(block), area);
}
