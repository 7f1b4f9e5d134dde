//! Types for the search orchestration layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentError;
use crate::store::{BookRecord, StoreError};

/// Which tier of the pipeline answered a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// At least one record was tagged with this exact canonical query.
    ExactCache,
    /// Enough free-text matches to trust the cache without the agent.
    TextSearch,
    /// The external agent was consulted and its results persisted.
    Agent,
}

/// Result of one search: the records plus which tier produced them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub records: Vec<BookRecord>,
    pub source: SearchSource,
}

/// Result of one download-link lookup: the links plus whether the cache
/// answered without an agent call.
#[derive(Debug, Clone, Serialize)]
pub struct LinksOutcome {
    pub links: Vec<String>,
    pub from_cache: bool,
}

/// Input for manually registering a book (POST /books).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub pages: String,
    #[serde(default)]
    pub publisher: String,
}

/// Errors surfaced by the lookup service.
///
/// Every failure in canonicalization, store access or agent invocation maps
/// into exactly one of these kinds and propagates unchanged to the caller.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Agent returned invalid data: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Book already exists: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(key) => LookupError::Conflict(key),
            StoreError::Database(msg) => LookupError::Upstream(msg),
            StoreError::Internal(msg) => LookupError::Upstream(msg),
        }
    }
}

impl From<AgentError> for LookupError {
    fn from(err: AgentError) -> Self {
        if err.is_validation() {
            LookupError::Validation(err.to_string())
        } else {
            LookupError::Upstream(err.to_string())
        }
    }
}
