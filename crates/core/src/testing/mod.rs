//! Testing utilities and mock implementations for E2E tests.
//!
//! Provides a mock implementation of the external agent trait plus record
//! fixtures, so the full lookup pipeline can be exercised without a real
//! LLM endpoint.

mod mock_agent;

pub use mock_agent::MockAgent;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::agent::BookMetadata;
    use crate::identity::identity_key;
    use crate::store::{BookRecord, PLACEHOLDER_COVER_URL};

    /// Create agent metadata with reasonable defaults.
    pub fn book_metadata(title: &str, author: &str) -> BookMetadata {
        BookMetadata {
            title: title.to_string(),
            author: author.to_string(),
            overview: format!("A book about {}.", title.to_lowercase()),
            cover_url: format!(
                "https://covers.example.com/{}.jpg",
                title.to_lowercase().replace(' ', "-")
            ),
            isbn: format!("978{:010}", title.len() * 7919),
            year: "2001".to_string(),
            genre: vec!["Fiction".to_string()],
            pages: "320".to_string(),
            publisher: "Test Press".to_string(),
        }
    }

    /// Create a cached record with reasonable defaults.
    pub fn book_record(title: &str, author: &str) -> BookRecord {
        let now = Utc::now();
        BookRecord {
            identity_key: identity_key(title, author),
            title: title.to_string(),
            author: author.to_string(),
            overview: format!("A book about {}.", title.to_lowercase()),
            cover_url: PLACEHOLDER_COVER_URL.to_string(),
            isbn: String::new(),
            year: "2001".to_string(),
            genre: vec!["Fiction".to_string()],
            pages: "320".to_string(),
            publisher: "Test Press".to_string(),
            download_links: vec![],
            cached_for_queries: vec![],
            first_cached_at: now,
            updated_at: now,
        }
    }
}
