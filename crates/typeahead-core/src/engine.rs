use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::SearchBackend;
use crate::config::TypeaheadConfig;
use crate::event::{Listener, TypeaheadEvent};
use crate::navigator::{Key, SelectionState};
use crate::query::{Applied, LookupOutcome, PendingLookup, QueryController, QueryDecision};
use crate::results::ResultList;
use crate::{Item, TypeaheadError};

/// A typeahead over one search backend.
///
/// All methods are meant to be called from a single event loop. Query
/// changes return a [`PendingLookup`] when the backend should be consulted;
/// the caller runs it and hands the outcome back through [`apply`].
///
/// [`apply`]: Typeahead::apply
pub struct Typeahead {
    config: TypeaheadConfig,
    backend: Arc<dyn SearchBackend>,
    controller: QueryController,
    results: ResultList,
    listener: Option<Listener>,
}

impl Typeahead {
    pub fn new(config: TypeaheadConfig, backend: Arc<dyn SearchBackend>) -> Self {
        let controller = QueryController::new(config.min_chars);
        Self {
            config,
            backend,
            controller,
            results: ResultList::new(),
            listener: None,
        }
    }

    /// Register the callback that receives every [`TypeaheadEvent`].
    pub fn with_listener(
        mut self,
        listener: impl Fn(&TypeaheadEvent) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(&self) -> &TypeaheadConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn query(&self) -> &str {
        self.controller.query()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    /// True when there is no query.
    pub fn is_empty(&self) -> bool {
        self.controller.query().is_empty()
    }

    /// True when there is a query.
    pub fn is_dirty(&self) -> bool {
        !self.is_empty()
    }

    pub fn results(&self) -> &ResultList {
        &self.results
    }

    pub fn items(&self) -> &[Item] {
        self.results.items()
    }

    pub fn current(&self) -> Option<usize> {
        self.results.current()
    }

    pub fn selection(&self) -> SelectionState {
        SelectionState::of(&self.results)
    }

    /// Generation of the most recent query change.
    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Replace the query. `None` is treated as the empty query.
    ///
    /// Any lookup still in flight is superseded. An empty query clears the
    /// results; a query under `min_chars` leaves them as they are. Otherwise
    /// a lookup is returned for the caller to run.
    pub fn set_query(&mut self, text: Option<&str>) -> Option<PendingLookup> {
        let decision = self.controller.set_query(text);
        self.emit(TypeaheadEvent::QueryChanged {
            query: self.controller.query().to_string(),
        });
        self.dispatch(decision)
    }

    /// Re-run the length gate for the current query, e.g. to retry after a
    /// failed lookup.
    pub fn refresh(&mut self) -> Option<PendingLookup> {
        let decision = self.controller.decide();
        self.dispatch(decision)
    }

    /// Issue a lookup for `query` under a fresh generation, bypassing the
    /// length gate.
    pub fn trigger_lookup(&mut self, query: &str) -> PendingLookup {
        let was_loading = self.controller.is_loading();
        let (generation, cancel) = self.controller.begin();
        debug!(generation, query, "issuing lookup");
        if !was_loading {
            self.emit(TypeaheadEvent::LoadingChanged { loading: true });
        }
        PendingLookup::new(
            generation,
            query.to_string(),
            Arc::clone(&self.backend),
            cancel,
            self.config.debounce(),
        )
    }

    /// Apply a finished lookup. Outcomes from superseded generations are
    /// dropped without touching any state.
    pub fn apply(&mut self, outcome: LookupOutcome) -> Applied {
        let LookupOutcome {
            generation,
            query,
            result,
        } = outcome;

        if !self.controller.finish(generation) {
            debug!(
                generation,
                current = self.controller.generation(),
                query = %query,
                "discarding stale lookup response"
            );
            return Applied::Stale;
        }
        self.emit(TypeaheadEvent::LoadingChanged { loading: false });

        match result {
            Ok(mut items) => {
                if let Some(limit) = self.config.limit {
                    items.truncate(limit);
                }
                let count = items.len();
                self.results.replace(items, self.config.select_first);
                debug!(generation, query = %query, count, "installed lookup results");
                self.emit(TypeaheadEvent::ResultsReplaced { query, count });
                self.emit(TypeaheadEvent::SelectionChanged {
                    index: self.results.current(),
                });
                Applied::Installed(count)
            }
            Err(error) => {
                warn!(
                    backend = self.backend.name(),
                    query = %query,
                    error = %error,
                    "lookup failed"
                );
                self.emit(TypeaheadEvent::LookupFailed {
                    query,
                    error: error.clone(),
                });
                Applied::Failed(error)
            }
        }
    }

    /// Clear the query, results, selection and loading state.
    pub fn reset(&mut self) {
        if self.is_dirty() {
            self.controller.set_query(None);
            self.emit(TypeaheadEvent::QueryChanged {
                query: String::new(),
            });
        }
        self.dispatch(QueryDecision::Clear);
    }

    fn dispatch(&mut self, decision: QueryDecision) -> Option<PendingLookup> {
        match decision {
            QueryDecision::Clear => {
                self.cancel_in_flight();
                self.results.clear();
                self.emit(TypeaheadEvent::ResultsCleared);
                self.emit(TypeaheadEvent::SelectionChanged { index: None });
                None
            }
            QueryDecision::TooShort => {
                self.cancel_in_flight();
                None
            }
            QueryDecision::Lookup => {
                let query = self.controller.query().to_string();
                Some(self.trigger_lookup(&query))
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        if self.controller.invalidate() {
            self.emit(TypeaheadEvent::LoadingChanged { loading: false });
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn up(&mut self) -> bool {
        self.navigate(Key::Up)
    }

    pub fn down(&mut self) -> bool {
        self.navigate(Key::Down)
    }

    fn navigate(&mut self, key: Key) -> bool {
        let moved = self.results.navigate(key);
        if moved {
            self.emit(TypeaheadEvent::SelectionChanged {
                index: self.results.current(),
            });
        }
        moved
    }

    /// Select `index` directly (pointer hover).
    pub fn set_active(&mut self, index: usize) -> Result<(), TypeaheadError> {
        if self.results.current() == Some(index) {
            return Ok(());
        }
        self.results.select(Some(index))?;
        self.emit(TypeaheadEvent::SelectionChanged { index: Some(index) });
        Ok(())
    }

    /// Commit to the selected item, if there is one.
    ///
    /// Emits [`TypeaheadEvent::ItemChosen`] exactly once per successful call
    /// and returns the item. Does not change any state.
    pub fn hit(&self) -> Option<Item> {
        let item = self.results.selected()?.clone();
        self.emit(TypeaheadEvent::ItemChosen { item: item.clone() });
        Some(item)
    }

    // ── Input surface ────────────────────────────────────────────────

    pub fn on_input_changed(&mut self, text: &str) -> Option<PendingLookup> {
        self.set_query(Some(text))
    }

    /// Returns `true` if the selection moved.
    pub fn on_key_down(&mut self, key: Key) -> bool {
        self.navigate(key)
    }

    pub fn on_pointer_enter(&mut self, index: usize) -> Result<(), TypeaheadError> {
        self.set_active(index)
    }

    pub fn on_commit_requested(&self) -> Option<Item> {
        self.hit()
    }

    fn emit(&self, event: TypeaheadEvent) {
        if let Some(listener) = &self.listener {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LookupError;
    use crate::backend::mock::{MockResponse, MockSearch};
    use serde_json::json;
    use std::sync::Mutex;

    fn items() -> Vec<Item> {
        vec![
            Item::new(json!({ "disasterNumber": 4311, "declaredCountyArea": "Box Elder (County)" })),
            Item::new(json!({ "disasterNumber": 4311, "declaredCountyArea": "Cache (County)" })),
        ]
    }

    fn engine(config: TypeaheadConfig) -> Typeahead {
        let backend = Arc::new(MockSearch::new("mock", MockResponse::Items(items())));
        Typeahead::new(config, backend)
    }

    fn recording(config: TypeaheadConfig) -> (Typeahead, Arc<Mutex<Vec<TypeaheadEvent>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let engine = engine(config).with_listener(move |e| sink.lock().unwrap().push(e.clone()));
        (engine, log)
    }

    fn outcome(generation: u64, result: Result<Vec<Item>, LookupError>) -> LookupOutcome {
        LookupOutcome {
            generation,
            query: "DR-4311".to_string(),
            result,
        }
    }

    #[test]
    fn short_query_issues_no_lookup() {
        let mut t = engine(TypeaheadConfig::default());
        assert_eq!(t.config().min_chars, 2);
        assert!(t.set_query(Some("A")).is_none());
        assert!(!t.is_loading());
    }

    #[test]
    fn long_query_sets_loading() {
        let mut t = engine(TypeaheadConfig::default());
        let pending = t.set_query(Some("DR-4311")).expect("lookup");
        assert_eq!(pending.query(), "DR-4311");
        assert!(t.is_loading());
    }

    #[test]
    fn unset_query_resets_to_empty() {
        let mut t = engine(TypeaheadConfig::default());
        t.set_query(Some("DR-4311"));
        assert!(t.set_query(None).is_none());
        assert_eq!(t.query(), "");
        assert!(t.is_empty());
        assert!(!t.is_loading());
    }

    #[test]
    fn applied_results_start_unselected() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        assert_eq!(t.apply(outcome(g, Ok(items()))), Applied::Installed(2));
        assert_eq!(t.selection(), SelectionState::Unselected);
        assert!(!t.is_loading());
    }

    #[test]
    fn select_first_selects_head_on_arrival() {
        let mut t = engine(TypeaheadConfig {
            select_first: true,
            ..Default::default()
        });
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        assert_eq!(t.current(), Some(0));
    }

    #[test]
    fn limit_truncates_results() {
        let mut t = engine(TypeaheadConfig {
            limit: Some(1),
            ..Default::default()
        });
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        assert_eq!(t.apply(outcome(g, Ok(items()))), Applied::Installed(1));
        assert_eq!(t.items().len(), 1);
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut t = engine(TypeaheadConfig::default());
        let first = t.set_query(Some("DR-43")).unwrap().generation();
        let second = t.set_query(Some("DR-4311")).unwrap().generation();

        assert_eq!(t.apply(outcome(second, Ok(items()))), Applied::Installed(2));
        assert_eq!(t.apply(outcome(first, Ok(vec![]))), Applied::Stale);
        assert_eq!(t.items().len(), 2);
    }

    #[test]
    fn stale_outcome_does_not_end_loading() {
        let mut t = engine(TypeaheadConfig::default());
        let first = t.set_query(Some("DR-43")).unwrap().generation();
        t.set_query(Some("DR-4311"));
        assert_eq!(t.apply(outcome(first, Ok(items()))), Applied::Stale);
        assert!(t.is_loading());
        assert!(t.items().is_empty());
    }

    #[test]
    fn clearing_query_drops_in_flight_results() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.set_query(Some(""));
        assert_eq!(t.apply(outcome(g, Ok(items()))), Applied::Stale);
        assert!(t.items().is_empty());
        assert_eq!(t.current(), None);
    }

    #[test]
    fn clearing_query_empties_results_synchronously() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        t.down();
        t.set_query(Some(""));
        assert!(t.items().is_empty());
        assert_eq!(t.selection(), SelectionState::Empty);
    }

    #[test]
    fn short_query_keeps_existing_results() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        assert!(t.set_query(Some("D")).is_none());
        assert_eq!(t.items().len(), 2);
        assert!(!t.is_loading());
    }

    #[test]
    fn short_query_supersedes_in_flight_lookup() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));

        let pending = t.set_query(Some("DR-4312")).unwrap();
        assert!(t.is_loading());
        assert!(t.set_query(Some("D")).is_none());
        assert!(pending.is_superseded());
        assert!(!t.is_loading());

        let late = outcome(pending.generation(), Ok(vec![]));
        assert_eq!(t.apply(late), Applied::Stale);
        assert_eq!(t.results().len(), 2);
        assert_eq!(t.items(), items().as_slice());
        assert!(!t.is_loading());
    }

    #[test]
    fn failure_keeps_last_good_results() {
        let (mut t, log) = recording(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));

        let g = t.set_query(Some("DR-4312")).unwrap().generation();
        let err = LookupError::Status(503);
        assert_eq!(
            t.apply(outcome(g, Err(err.clone()))),
            Applied::Failed(err.clone())
        );
        assert_eq!(t.items().len(), 2);
        assert!(!t.is_loading());
        assert!(log.lock().unwrap().iter().any(|e| matches!(
            e,
            TypeaheadEvent::LookupFailed { error, .. } if *error == err
        )));
    }

    #[test]
    fn stale_failure_is_not_reported() {
        let (mut t, log) = recording(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-43")).unwrap().generation();
        t.set_query(Some("DR-4311"));
        t.apply(outcome(g, Err(LookupError::Cancelled)));
        assert!(
            !log.lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, TypeaheadEvent::LookupFailed { .. }))
        );
    }

    #[test]
    fn hit_without_selection_is_silent() {
        let (mut t, log) = recording(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        assert_eq!(t.hit(), None);
        assert!(
            !log.lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, TypeaheadEvent::ItemChosen { .. }))
        );
    }

    #[test]
    fn up_then_hit_chooses_last_item_once() {
        let (mut t, log) = recording(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        assert!(t.on_key_down(Key::Up));
        assert_eq!(t.current(), Some(1));

        let chosen = t.on_commit_requested();
        assert_eq!(chosen, Some(items()[1].clone()));
        let hits: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                TypeaheadEvent::ItemChosen { item } => Some(item.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![items()[1].clone()]);
        assert_eq!(t.current(), Some(1));
    }

    #[test]
    fn set_active_is_bounds_checked() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        assert!(t.on_pointer_enter(1).is_ok());
        assert_eq!(t.current(), Some(1));
        assert_eq!(
            t.set_active(2),
            Err(TypeaheadError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(t.current(), Some(1));
    }

    #[test]
    fn reset_clears_everything() {
        let mut t = engine(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.apply(outcome(g, Ok(items())));
        t.set_query(Some("DR-43112"));
        t.reset();
        assert_eq!(t.query(), "");
        assert!(t.items().is_empty());
        assert!(!t.is_loading());
    }

    #[test]
    fn refresh_reissues_current_query() {
        let mut t = engine(TypeaheadConfig::default());
        let first = t.set_query(Some("DR-4311")).unwrap().generation();
        let again = t.refresh().expect("lookup");
        assert_eq!(again.query(), "DR-4311");
        assert!(again.generation() > first);
    }

    #[test]
    fn loading_events_bracket_a_lookup() {
        let (mut t, log) = recording(TypeaheadConfig::default());
        let g = t.set_query(Some("DR-4311")).unwrap().generation();
        t.set_query(Some("DR-43111"));
        let g2 = t.generation();
        t.apply(outcome(g, Ok(items())));
        t.apply(outcome(g2, Ok(items())));

        let loading: Vec<bool> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                TypeaheadEvent::LoadingChanged { loading } => Some(*loading),
                _ => None,
            })
            .collect();
        assert_eq!(loading, vec![true, false]);
    }
}
