//! Types for the external book agent.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Maximum books the agent may return for one search.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Maximum download-link candidates the agent may return.
pub const MAX_LINK_RESULTS: usize = 5;

/// One book as reported by the agent, before it becomes a cached record.
///
/// Every field is required: a response missing any of them is a schema
/// violation, not a partial result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub overview: String,
    pub cover_url: String,
    pub isbn: String,
    pub year: String,
    pub genre: Vec<String>,
    pub pages: String,
    pub publisher: String,
}

/// Errors for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid JSON from agent: {0}")]
    InvalidJson(String),

    #[error("Agent response violates schema: {0}")]
    SchemaViolation(String),
}

impl AgentError {
    /// Whether this error means the agent produced unusable output (as
    /// opposed to being unreachable).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AgentError::InvalidJson(_) | AgentError::SchemaViolation(_)
        )
    }
}
