//! Lookup pipeline integration tests.
//!
//! These tests exercise the full tiered flow against a real on-disk SQLite
//! store with a mock agent: cold cache -> agent -> tagged records -> exact
//! cache, the text-search middle tier, and the download-link cache.

use std::sync::Arc;

use tempfile::TempDir;

use bookdex_core::{
    testing::{fixtures, MockAgent},
    AgentError, BookLookup, BookStore, LookupConfig, LookupError, NewBook, SearchSource,
    SqliteBookStore,
};

struct TestHarness {
    store: Arc<SqliteBookStore>,
    agent: Arc<MockAgent>,
    lookup: BookLookup,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(LookupConfig::default())
    }

    fn with_config(config: LookupConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("books.db");
        let store = Arc::new(SqliteBookStore::new(&db_path).expect("Failed to create store"));
        let agent = Arc::new(MockAgent::new());
        let lookup = BookLookup::new(
            Arc::clone(&store) as Arc<dyn bookdex_core::BookStore>,
            Arc::clone(&agent) as Arc<dyn bookdex_core::BookAgent>,
            config,
        );
        Self {
            store,
            agent,
            lookup,
            _temp_dir: temp_dir,
        }
    }

    fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            overview: format!("A story about {}.", title.to_lowercase()),
            cover_url: String::new(),
            isbn: String::new(),
            year: String::new(),
            genre: vec![],
            pages: String::new(),
            publisher: String::new(),
        }
    }
}

#[tokio::test]
async fn test_cold_then_warm_search() {
    let h = TestHarness::new();
    h.agent.set_search_results(vec![
        fixtures::book_metadata("Dune", "Frank Herbert"),
        fixtures::book_metadata("Dune Messiah", "Frank Herbert"),
    ]);

    let cold = h.lookup.search("dune herbert").await.unwrap();
    assert_eq!(cold.source, SearchSource::Agent);
    assert_eq!(cold.records.len(), 2);
    for record in &cold.records {
        assert_eq!(record.cached_for_queries, vec!["dune herbert"]);
    }

    // Same query, different capitalization and punctuation: served from the
    // tag index without touching the agent again.
    let warm = h.lookup.search("Dune, Herbert!").await.unwrap();
    assert_eq!(warm.source, SearchSource::ExactCache);
    assert_eq!(warm.records.len(), 2);
    assert_eq!(h.agent.search_calls().len(), 1);
}

#[tokio::test]
async fn test_distinct_query_tags_accumulate_on_same_record() {
    let h = TestHarness::new();
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);

    h.lookup.search("dune").await.unwrap();
    h.lookup.search("sand planet novel").await.unwrap();

    let records = h.store.get_exact("dune").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].cached_for_queries,
        vec!["dune", "sand planet novel"]
    );
    assert_eq!(h.agent.search_calls().len(), 2);
}

#[tokio::test]
async fn test_text_tier_answers_without_agent() {
    let h = TestHarness::new();
    for title in ["Rust in Action", "Programming Rust", "The Rust Book"] {
        h.lookup
            .add_manual(&TestHarness::new_book(title, "Various"))
            .unwrap();
    }

    let outcome = h.lookup.search("rust").await.unwrap();
    assert_eq!(outcome.source, SearchSource::TextSearch);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(h.agent.search_calls().len(), 0);
}

#[tokio::test]
async fn test_raised_threshold_forces_agent() {
    let h = TestHarness::with_config(LookupConfig {
        text_match_threshold: 5,
        text_search_limit: 10,
    });
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Rust Atlas", "Nobody")]);
    for title in ["Rust in Action", "Programming Rust", "The Rust Book"] {
        h.lookup
            .add_manual(&TestHarness::new_book(title, "Various"))
            .unwrap();
    }

    let outcome = h.lookup.search("rust").await.unwrap();
    assert_eq!(outcome.source, SearchSource::Agent);
    assert_eq!(h.agent.search_calls().len(), 1);
}

#[tokio::test]
async fn test_agent_validation_failure_leaves_store_unchanged() {
    let h = TestHarness::new();
    h.agent.fail_next_search(AgentError::SchemaViolation(
        "missing required field: isbn".into(),
    ));

    let err = h.lookup.search("dune").await.unwrap_err();
    assert!(matches!(err, LookupError::Validation(_)));
    assert_eq!(h.store.stats().unwrap().total_books, 0);

    // Next attempt goes back to the agent, nothing was poisoned.
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);
    let outcome = h.lookup.search("dune").await.unwrap();
    assert_eq!(outcome.source, SearchSource::Agent);
}

#[tokio::test]
async fn test_link_cache_round_trip() {
    let h = TestHarness::new();
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);
    h.agent.set_link_results(vec![
        "https://mirror-a.example.com/dune.epub".to_string(),
        "https://mirror-b.example.com/dune.pdf".to_string(),
    ]);

    let outcome = h.lookup.search("dune").await.unwrap();
    let key = outcome.records[0].identity_key.clone();

    let first = h.lookup.links(&key).await.unwrap();
    assert_eq!(first.links.len(), 2);
    assert!(!first.from_cache);
    assert_eq!(h.agent.link_calls(), vec!["Dune Frank Herbert"]);

    // Cached now, even if the agent would answer differently.
    h.agent.set_link_results(vec![]);
    let second = h.lookup.links(&key).await.unwrap();
    assert_eq!(second.links, first.links);
    assert!(second.from_cache);
    assert_eq!(h.agent.link_calls().len(), 1);
}

#[tokio::test]
async fn test_empty_link_result_retried_next_time() {
    let h = TestHarness::new();
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);
    let outcome = h.lookup.search("dune").await.unwrap();
    let key = outcome.records[0].identity_key.clone();

    let empty = h.lookup.links(&key).await.unwrap();
    assert!(empty.links.is_empty());
    assert!(!empty.from_cache);

    // An empty cached list is indistinguishable from never-fetched, so the
    // agent is consulted again.
    h.agent
        .set_link_results(vec!["https://example.com/dune.epub".to_string()]);
    let retried = h.lookup.links(&key).await.unwrap();
    assert_eq!(retried.links.len(), 1);
    assert!(!retried.from_cache);
    assert_eq!(h.agent.link_calls().len(), 2);
}

#[tokio::test]
async fn test_link_fetch_failure_propagates_and_caches_nothing() {
    let h = TestHarness::new();
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);
    let outcome = h.lookup.search("dune").await.unwrap();
    let key = outcome.records[0].identity_key.clone();

    h.agent
        .fail_next_link(AgentError::Http("connection reset".into()));
    let err = h.lookup.links(&key).await.unwrap_err();
    assert!(matches!(err, LookupError::Upstream(_)));
    assert!(h.lookup.get(&key).unwrap().download_links.is_empty());
}

#[tokio::test]
async fn test_delete_reopens_query_to_agent() {
    let h = TestHarness::new();
    h.agent
        .set_search_results(vec![fixtures::book_metadata("Dune", "Frank Herbert")]);

    let outcome = h.lookup.search("dune").await.unwrap();
    let key = outcome.records[0].identity_key.clone();
    h.lookup.delete(&key).unwrap();

    let again = h.lookup.search("dune").await.unwrap();
    assert_eq!(again.source, SearchSource::Agent);
    assert_eq!(h.agent.search_calls().len(), 2);
}

#[tokio::test]
async fn test_stats_reflect_cache_contents() {
    let h = TestHarness::new();
    h.agent.set_search_results(vec![
        fixtures::book_metadata("Dune", "Frank Herbert"),
        fixtures::book_metadata("Hyperion", "Dan Simmons"),
    ]);
    h.agent
        .set_link_results(vec!["https://example.com/dune.epub".to_string()]);

    let outcome = h.lookup.search("science fiction classics").await.unwrap();
    h.lookup
        .links(&outcome.records[0].identity_key)
        .await
        .unwrap();

    let stats = h.lookup.stats().unwrap();
    assert_eq!(stats.total_books, 2);
    assert_eq!(stats.total_queries, 1);
    assert_eq!(stats.books_with_links, 1);
    assert!(stats.oldest_entry.is_some());
    assert!(stats.newest_entry.is_some());
}
