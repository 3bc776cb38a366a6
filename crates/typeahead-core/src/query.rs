//! Query gating and generation-tagged lookups.
//!
//! Every query change bumps the generation. A lookup is tagged with the
//! generation it was issued under, and its outcome is only honored if no
//! newer generation exists by the time it comes back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Item;
use crate::backend::{LookupError, SearchBackend};

/// What a query change asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDecision {
    /// Query is empty: drop the results.
    Clear,
    /// Query is shorter than the minimum: leave the results alone.
    TooShort,
    /// Query is long enough to look up.
    Lookup,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Owns the query text, the generation counter, and the in-flight lookup.
pub struct QueryController {
    query: String,
    min_chars: usize,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl QueryController {
    pub fn new(min_chars: usize) -> Self {
        Self {
            query: String::new(),
            min_chars,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Store a new query (`None` counts as empty) and classify it.
    pub fn set_query(&mut self, text: Option<&str>) -> QueryDecision {
        self.query = text.unwrap_or_default().to_string();
        self.decide()
    }

    /// Classify the current query against the length gate.
    pub fn decide(&self) -> QueryDecision {
        if self.query.is_empty() {
            QueryDecision::Clear
        } else if self.query.chars().count() < self.min_chars {
            QueryDecision::TooShort
        } else {
            QueryDecision::Lookup
        }
    }

    /// Start a new generation, superseding whatever was in flight.
    ///
    /// Returns `true` if a lookup was in flight.
    pub fn invalidate(&mut self) -> bool {
        self.generation += 1;
        match self.in_flight.take() {
            Some(prev) => {
                prev.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Start a new generation with a lookup in flight for it.
    pub fn begin(&mut self) -> (u64, CancellationToken) {
        self.invalidate();
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation: self.generation,
            cancel: cancel.clone(),
        });
        (self.generation, cancel)
    }

    /// Mark the lookup tagged `generation` as finished.
    ///
    /// Returns `false` if it is stale, in which case nothing changes.
    pub fn finish(&mut self, generation: u64) -> bool {
        match &self.in_flight {
            Some(f) if f.generation == generation && generation == self.generation => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

/// The result of one lookup, tagged with the generation it was issued under.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub generation: u64,
    pub query: String,
    pub result: Result<Vec<Item>, LookupError>,
}

/// What [`Typeahead::apply`](crate::Typeahead::apply) did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Results installed; carries the number of items kept.
    Installed(usize),
    /// The current lookup failed; results were left as they were.
    Failed(LookupError),
    /// A newer query superseded this lookup; it was ignored.
    Stale,
}

/// A lookup that has been issued but not yet run.
///
/// Await it directly, or [`spawn`](PendingLookup::spawn) it and feed the
/// outcome back to the engine from the event loop.
pub struct PendingLookup {
    generation: u64,
    query: String,
    cancel: CancellationToken,
    future: Pin<Box<dyn Future<Output = LookupOutcome> + Send + 'static>>,
}

impl std::fmt::Debug for PendingLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLookup")
            .field("generation", &self.generation)
            .field("query", &self.query)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl PendingLookup {
    pub(crate) fn new(
        generation: u64,
        query: String,
        backend: Arc<dyn SearchBackend>,
        cancel: CancellationToken,
        debounce: Duration,
    ) -> Self {
        let q = query.clone();
        let token = cancel.clone();
        let future = Box::pin(async move {
            let result = run_lookup(backend.as_ref(), &q, token, debounce).await;
            LookupOutcome {
                generation,
                query: q,
                result,
            }
        });
        Self {
            generation,
            query,
            cancel,
            future,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether a newer query has already superseded this lookup.
    pub fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run on the tokio runtime, sending the outcome to `tx` when done.
    pub fn spawn(self, tx: mpsc::UnboundedSender<LookupOutcome>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let outcome = self.await;
            // Receiver gone means the UI is shutting down.
            let _ = tx.send(outcome);
        })
    }
}

impl Future for PendingLookup {
    type Output = LookupOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().future.as_mut().poll(cx)
    }
}

async fn run_lookup(
    backend: &dyn SearchBackend,
    query: &str,
    cancel: CancellationToken,
    debounce: Duration,
) -> Result<Vec<Item>, LookupError> {
    if !debounce.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return Err(LookupError::Cancelled),
            _ = tokio::time::sleep(debounce) => {}
        }
    }
    if cancel.is_cancelled() {
        return Err(LookupError::Cancelled);
    }
    tracing::debug!(backend = backend.name(), query, "calling search backend");
    backend.search(query, cancel).await
}
