use crate::Item;
use crate::backend::LookupError;

/// State changes emitted by a [`Typeahead`](crate::Typeahead) for the
/// rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeaheadEvent {
    QueryChanged { query: String },
    LoadingChanged { loading: bool },
    ResultsReplaced { query: String, count: usize },
    ResultsCleared,
    SelectionChanged { index: Option<usize> },
    /// The user committed to a suggestion.
    ItemChosen { item: Item },
    /// The current lookup failed. Stale failures are never reported.
    LookupFailed { query: String, error: LookupError },
}

/// Callback receiving every [`TypeaheadEvent`].
pub type Listener = Box<dyn Fn(&TypeaheadEvent) + Send + Sync>;
