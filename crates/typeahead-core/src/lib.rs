//! Typeahead engine: query gating, stale-safe asynchronous lookups, and
//! keyboard navigation over the returned suggestions.
//!
//! The engine ([`Typeahead`]) is a plain single-owner struct driven from one
//! event loop. Lookups are handed back to the caller as [`PendingLookup`]
//! futures; their [`LookupOutcome`] is fed back through [`Typeahead::apply`],
//! which discards anything superseded by a newer query.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod event;
pub mod navigator;
pub mod query;
pub mod results;

// Re-export for convenience
pub use backend::http::{HttpSearch, SearchConfig};
pub use backend::{LookupError, SearchBackend};
pub use config::TypeaheadConfig;
pub use engine::Typeahead;
pub use event::TypeaheadEvent;
pub use navigator::{Key, SelectionState};
pub use query::{Applied, LookupOutcome, PendingLookup};
pub use results::ResultList;

/// A single suggestion returned by a search backend.
///
/// The engine treats items as opaque records; only their order matters to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub serde_json::Value);

impl Item {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Look up a top-level field of an object record.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.as_object().and_then(|o| o.get(name))
    }
}

impl From<serde_json::Value> for Item {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeaheadError {
    #[error("index {index} is out of range for {len} results")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
