//! Common test utilities for E2E testing with mocks.
//!
//! Provides a test fixture that builds the full router in-process with a
//! mock agent injected, so every endpoint can be exercised without a real
//! LLM endpoint or network.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bookdex_core::{
    testing::MockAgent, AgentConfig, BookAgent, BookLookup, BookStore, Config, DatabaseConfig,
    LookupConfig, ServerConfig, SqliteBookStore,
};

/// Re-export fixtures for test convenience
pub use bookdex_core::testing::fixtures;

/// Test fixture for E2E testing with a mock agent.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/api/v2/books?search=dune").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock agent - configure search and link results
    pub agent: Arc<MockAgent>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub fn new() -> Self {
        Self::with_lookup_config(LookupConfig::default())
    }

    /// Create a test fixture with custom lookup tuning.
    pub fn with_lookup_config(lookup_config: LookupConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            agent: AgentConfig {
                base_url: "http://localhost:1/v1".to_string(),
                api_key: "test-key".to_string(),
                model: "test-model".to_string(),
                timeout_secs: 5,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            lookup: lookup_config.clone(),
        };

        let store: Arc<dyn BookStore> =
            Arc::new(SqliteBookStore::new(&db_path).expect("Failed to create store"));
        let agent = Arc::new(MockAgent::new());

        let lookup = Arc::new(BookLookup::new(
            Arc::clone(&store),
            Arc::clone(&agent) as Arc<dyn BookAgent>,
            lookup_config,
        ));

        let state = Arc::new(bookdex_server::state::AppState::new(config, store, lookup));
        let router = bookdex_server::api::create_router(state);

        Self {
            router,
            agent,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };

        TestResponse { status, body }
    }
}
