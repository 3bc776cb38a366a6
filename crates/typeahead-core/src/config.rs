use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum query length used when nothing else is configured.
pub const DEFAULT_MIN_CHARS: usize = 2;

/// Behavior knobs for a [`Typeahead`](crate::Typeahead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeaheadConfig {
    /// Queries shorter than this (in characters) never reach the backend.
    pub min_chars: usize,
    /// Select the first result as soon as a non-empty list arrives.
    pub select_first: bool,
    /// Keep at most this many results from each response.
    pub limit: Option<usize>,
    /// Wait this long after the last query change before calling the backend.
    pub debounce_ms: u64,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            select_first: false,
            limit: None,
            debounce_ms: 0,
        }
    }
}

impl TypeaheadConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
