//! Search backend trait and implementations.

pub mod http;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::Item;

/// Future returned by [`SearchBackend::search`].
pub type SearchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Item>, LookupError>> + Send + 'a>>;

/// Why a lookup produced no result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("lookup timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("lookup cancelled")]
    Cancelled,
}

/// A remote (or local) source of suggestions for a query.
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs (e.g. "http", "mock").
    fn name(&self) -> &str;

    /// Look up suggestions for `query`.
    ///
    /// `cancel` fires once a newer query supersedes this one. Backends may
    /// stop early when it does; the engine discards the outcome either way.
    fn search<'a>(&'a self, query: &'a str, cancel: CancellationToken) -> SearchFuture<'a>;
}
