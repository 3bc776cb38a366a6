use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use typeahead_core::{
    Item, LookupOutcome, PendingLookup, SearchBackend, Typeahead, TypeaheadConfig, TypeaheadEvent,
};

use crate::action::Action;
use crate::theme::Theme;


/// One-line message shown under the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

/// Where the result list was last drawn, for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListGeometry {
    /// Inner area of the list (inside the border).
    pub inner: Rect,
    /// Index of the first visible item. Carried across draws so the list
    /// only scrolls when the selection leaves the window.
    pub offset: usize,
}

pub struct App {
    pub engine: Typeahead,
    engine_events: mpsc::UnboundedReceiver<TypeaheadEvent>,
    /// Where spawned lookups report back. `None` drops lookups unrun.
    lookup_tx: Option<mpsc::UnboundedSender<LookupOutcome>>,
    /// Items chosen so far, oldest first.
    pub extracts: Vec<Item>,
    pub status: Option<StatusLine>,
    pub label_fields: Vec<String>,
    pub theme: Theme,
    pub tick: usize,
    pub should_quit: bool,
    pub list_geometry: Option<ListGeometry>,
}

impl App {
    pub fn new(
        config: TypeaheadConfig,
        backend: Arc<dyn SearchBackend>,
        theme: Theme,
        label_fields: Vec<String>,
    ) -> Self {
        let (events_tx, engine_events) = mpsc::unbounded_channel();
        let engine = Typeahead::new(config, backend).with_listener(move |event| {
            let _ = events_tx.send(event.clone());
        });
        Self {
            engine,
            engine_events,
            lookup_tx: None,
            extracts: Vec::new(),
            status: None,
            label_fields,
            theme,
            tick: 0,
            should_quit: false,
            list_geometry: None,
        }
    }

    /// Spawn lookups onto the runtime and deliver their outcomes to `tx`.
    pub fn with_lookup_sender(mut self, tx: mpsc::UnboundedSender<LookupOutcome>) -> Self {
        self.lookup_tx = Some(tx);
        self
    }

    /// Handle a UI action. Returns true if quit was requested.
    pub fn update(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Input(c) => {
                let mut query = self.engine.query().to_string();
                query.push(c);
                self.set_query(&query);
            }
            Action::Backspace => {
                let mut query = self.engine.query().to_string();
                if query.pop().is_some() {
                    self.set_query(&query);
                }
            }
            Action::Escape => {
                if self.engine.is_dirty() {
                    self.engine.reset();
                    self.status = None;
                } else {
                    self.should_quit = true;
                }
            }
            Action::MoveUp => {
                self.engine.up();
            }
            Action::MoveDown => {
                self.engine.down();
            }
            Action::Commit => {
                self.engine.on_commit_requested();
            }
            Action::Retry => {
                let pending = self.engine.refresh();
                self.run(pending);
            }
            Action::RemoveLastExtract => {
                if self.extracts.pop().is_some() {
                    self.status = Some(StatusLine::Info("Removed last extract".to_string()));
                }
            }
            Action::HoverAt(x, y) => {
                if let Some(index) = self.row_at(x, y) {
                    let _ = self.engine.on_pointer_enter(index);
                }
            }
            Action::ClickAt(x, y) => {
                if let Some(index) = self.row_at(x, y)
                    && self.engine.on_pointer_enter(index).is_ok()
                {
                    self.engine.on_commit_requested();
                }
            }
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            Action::Resize(..) | Action::None => {}
        }
        self.drain_engine_events();
        self.should_quit
    }

    /// Feed a finished lookup back into the engine.
    pub fn handle_outcome(&mut self, outcome: LookupOutcome) {
        self.engine.apply(outcome);
        self.drain_engine_events();
    }

    fn set_query(&mut self, query: &str) {
        let pending = self.engine.on_input_changed(query);
        self.run(pending);
    }

    fn run(&mut self, pending: Option<PendingLookup>) {
        if let (Some(pending), Some(tx)) = (pending, &self.lookup_tx) {
            pending.spawn(tx.clone());
        }
    }

    fn drain_engine_events(&mut self) {
        while let Ok(event) = self.engine_events.try_recv() {
            self.handle_engine_event(event);
        }
    }

    fn handle_engine_event(&mut self, event: TypeaheadEvent) {
        match event {
            TypeaheadEvent::ResultsReplaced { count, .. } => {
                self.scroll_to_top();
                let noun = if count == 1 { "match" } else { "matches" };
                self.status = Some(StatusLine::Info(format!("{count} {noun}")));
            }
            TypeaheadEvent::ItemChosen { item } => {
                let label = crate::view::item_label(&item, &self.label_fields);
                if self.extracts.iter().any(|e| same_item(e, &item)) {
                    self.status = Some(StatusLine::Info(format!("Already added: {label}")));
                } else {
                    self.status = Some(StatusLine::Info(format!("Added: {label}")));
                    self.extracts.push(item);
                }
            }
            TypeaheadEvent::LookupFailed { query, error } => {
                self.status = Some(StatusLine::Error(format!(
                    "Search for \"{query}\" failed: {error} (Ctrl+R to retry)"
                )));
            }
            TypeaheadEvent::ResultsCleared => {
                self.scroll_to_top();
                self.status = None;
            }
            TypeaheadEvent::QueryChanged { .. }
            | TypeaheadEvent::LoadingChanged { .. }
            | TypeaheadEvent::SelectionChanged { .. } => {}
        }
    }

    fn scroll_to_top(&mut self) {
        if let Some(geometry) = &mut self.list_geometry {
            geometry.offset = 0;
        }
    }

    /// Result index under a screen position, if any.
    pub fn row_at(&self, x: u16, y: u16) -> Option<usize> {
        let geometry = self.list_geometry?;
        let inner = geometry.inner;
        if x < inner.x || x >= inner.x + inner.width || y < inner.y || y >= inner.y + inner.height {
            return None;
        }
        let index = geometry.offset + (y - inner.y) as usize;
        (index < self.engine.items().len()).then_some(index)
    }

    pub fn view(&mut self, f: &mut ratatui::Frame) {
        self.list_geometry = crate::view::render(f, self);
    }
}

/// Items with an `id` field are the same if the ids match; otherwise the
/// whole record is compared.
fn same_item(a: &Item, b: &Item) -> bool {
    match (a.field("id"), b.field("id")) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
