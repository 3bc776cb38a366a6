//! Mock search backend for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{LookupError, SearchBackend, SearchFuture};
use crate::Item;

/// A configurable mock response for [`MockSearch`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Resolve with these items.
    Items(Vec<Item>),
    /// Fail with this error.
    Error(LookupError),
    /// Wait, then behave like the inner response.
    Delayed(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn delayed(self, delay: Duration) -> Self {
        MockResponse::Delayed(delay, Box::new(self))
    }
}

/// A hand-rolled mock implementing [`SearchBackend`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, falling back to the last).
/// - Optional per-call latency.
/// - Call counting and a record of the queries seen.
///
/// The cancellation token is ignored, so a superseded call still resolves
/// and exercises stale-response handling.
pub struct MockSearch {
    name: &'static str,
    /// Each call pops the next response; `fallback` is used once it is empty.
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockResponse) -> Self {
        Self {
            name,
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            name,
            responses: Mutex::new(responses),
            fallback,
            delay: None,
            call_count: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `search()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Queries seen so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap();
        if let Some(resp) = seq.pop() {
            resp
        } else {
            self.fallback.clone()
        }
    }
}

impl SearchBackend for MockSearch {
    fn name(&self) -> &str {
        self.name
    }

    fn search<'a>(&'a self, query: &'a str, _cancel: CancellationToken) -> SearchFuture<'a> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        let mut response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            loop {
                match response {
                    MockResponse::Items(items) => return Ok(items),
                    MockResponse::Error(e) => return Err(e),
                    MockResponse::Delayed(d, inner) => {
                        tokio::time::sleep(d).await;
                        response = *inner;
                    }
                }
            }
        })
    }
}
