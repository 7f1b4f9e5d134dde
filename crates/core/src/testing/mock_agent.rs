//! Mock book agent for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::agent::{AgentError, BookAgent, BookMetadata};

/// Mock implementation of the [`BookAgent`] trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search and link results
/// - Track queries for assertions
/// - Simulate failures (one-shot error injection)
///
/// # Example
///
/// ```rust,ignore
/// use bookdex_core::testing::{fixtures, MockAgent};
///
/// let agent = MockAgent::new();
/// agent.set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);
///
/// let books = agent.search("dune").await?;
/// assert_eq!(books.len(), 1);
/// assert_eq!(agent.search_calls(), vec!["dune"]);
/// ```
pub struct MockAgent {
    /// Configured results returned by every search.
    search_results: Mutex<Vec<BookMetadata>>,
    /// Configured results returned by every link fetch.
    link_results: Mutex<Vec<String>>,
    /// Recorded search queries.
    search_calls: Mutex<Vec<String>>,
    /// Recorded link queries.
    link_calls: Mutex<Vec<String>>,
    /// If set, the next search fails with this error.
    next_search_error: Mutex<Option<AgentError>>,
    /// If set, the next link fetch fails with this error.
    next_link_error: Mutex<Option<AgentError>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            search_results: Mutex::new(Vec::new()),
            link_results: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
            link_calls: Mutex::new(Vec::new()),
            next_search_error: Mutex::new(None),
            next_link_error: Mutex::new(None),
        }
    }

    /// Configure the books every subsequent search returns.
    pub fn set_search_results(&self, results: Vec<BookMetadata>) {
        *self.search_results.lock().unwrap() = results;
    }

    /// Configure the links every subsequent fetch returns.
    pub fn set_link_results(&self, results: Vec<String>) {
        *self.link_results.lock().unwrap() = results;
    }

    /// Make the next search call fail with the given error.
    pub fn fail_next_search(&self, error: AgentError) {
        *self.next_search_error.lock().unwrap() = Some(error);
    }

    /// Make the next link fetch fail with the given error.
    pub fn fail_next_link(&self, error: AgentError) {
        *self.next_link_error.lock().unwrap() = Some(error);
    }

    /// Queries passed to `search`, in call order.
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Queries passed to `fetch_links`, in call order.
    pub fn link_calls(&self) -> Vec<String> {
        self.link_calls.lock().unwrap().clone()
    }
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookAgent for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<BookMetadata>, AgentError> {
        self.search_calls.lock().unwrap().push(query.to_string());
        if let Some(error) = self.next_search_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn fetch_links(&self, query: &str) -> Result<Vec<String>, AgentError> {
        self.link_calls.lock().unwrap().push(query.to_string());
        if let Some(error) = self.next_link_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.link_results.lock().unwrap().clone())
    }
}
