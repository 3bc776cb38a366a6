use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{LookupError, SearchBackend, SearchFuture};
use crate::{Item, TypeaheadError};

/// Where and how [`HttpSearch`] queries the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Endpoint URL; the query is appended as a URL parameter.
    pub src: String,
    /// Name of the URL parameter carrying the query.
    pub query_param: String,
    /// Extra static URL parameters sent with every request.
    pub params: BTreeMap<String, String>,
    /// JSON pointer to the result array inside the response (e.g. `/data`).
    /// The whole body is used when unset.
    pub results_pointer: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            query_param: "q".to_string(),
            params: BTreeMap::new(),
            results_pointer: None,
            timeout_secs: 10,
        }
    }
}

/// Queries a JSON search endpoint with `GET <src>?<query_param>=<query>`.
pub struct HttpSearch {
    config: SearchConfig,
    client: reqwest::Client,
}

impl HttpSearch {
    pub fn new(config: SearchConfig) -> Result<Self, TypeaheadError> {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: SearchConfig, client: reqwest::Client) -> Result<Self, TypeaheadError> {
        if config.src.trim().is_empty() {
            return Err(TypeaheadError::InvalidConfig(
                "no search endpoint configured".to_string(),
            ));
        }
        reqwest::Url::parse(&config.src).map_err(|e| {
            TypeaheadError::InvalidConfig(format!("bad search endpoint {:?}: {}", config.src, e))
        })?;
        if config.timeout_secs == 0 {
            return Err(TypeaheadError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn map_request_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout())
        } else {
            LookupError::Http(e.to_string())
        }
    }
}

impl SearchBackend for HttpSearch {
    fn name(&self) -> &str {
        "http"
    }

    fn search<'a>(&'a self, query: &'a str, cancel: CancellationToken) -> SearchFuture<'a> {
        Box::pin(async move {
            let request = self
                .client
                .get(&self.config.src)
                .query(&[(self.config.query_param.as_str(), query)])
                .query(&self.config.params)
                .timeout(self.timeout())
                .send();

            let resp = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LookupError::Cancelled),
                resp = request => resp.map_err(|e| self.map_request_error(e))?,
            };

            let status = resp.status();
            if !status.is_success() {
                return Err(LookupError::Status(status.as_u16()));
            }

            let body: Value = resp
                .json()
                .await
                .map_err(|e| LookupError::Decode(e.to_string()))?;
            extract_items(body, self.config.results_pointer.as_deref())
        })
    }
}

/// Pull the result array out of a response body.
///
/// A `null` body (or pointer target) is an empty result set; anything other
/// than an array is a decode error.
pub fn extract_items(body: Value, pointer: Option<&str>) -> Result<Vec<Item>, LookupError> {
    let target = match pointer {
        Some(p) => body
            .pointer(p)
            .cloned()
            .ok_or_else(|| LookupError::Decode(format!("response has no value at {}", p)))?,
        None => body,
    };

    match target {
        Value::Array(values) => Ok(values.into_iter().map(Item::from).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(LookupError::Decode(format!(
            "expected a JSON array, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
