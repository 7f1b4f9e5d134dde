//! External book agent - the LLM-backed black box that performs web search
//! and metadata extraction.
//!
//! The core only ever sees the agent through the [`BookAgent`] trait: a text
//! query in, a schema-validated list of books (or link candidates) out.

mod openai;
mod types;

pub use openai::OpenAiAgent;
pub use types::*;

use async_trait::async_trait;

/// Trait for book search agents.
#[async_trait]
pub trait BookAgent: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search for books matching a free-text query.
    ///
    /// Output is validated against the fixed record shape and capped at
    /// [`MAX_SEARCH_RESULTS`] entries before being trusted; validation
    /// failure fails the request, it is never retried.
    async fn search(&self, query: &str) -> Result<Vec<BookMetadata>, AgentError>;

    /// Find direct download candidates for a book ("{title} {author}").
    ///
    /// Output is validated as an array of at most [`MAX_LINK_RESULTS`]
    /// http(s) URLs.
    async fn fetch_links(&self, query: &str) -> Result<Vec<String>, AgentError>;
}
