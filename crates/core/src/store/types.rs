//! Types for the book cache store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cover image used when the agent could not find one.
pub const PLACEHOLDER_COVER_URL: &str =
    "https://rhbooks.com.ng/wp-content/uploads/2022/03/book-placeholder.png";

/// A cached book record, one per distinct title+author identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Content hash of lowercased title+author, see [`crate::identity_key`].
    pub identity_key: String,
    pub title: String,
    pub author: String,
    /// Free text, sanitized before persisting.
    pub overview: String,
    pub cover_url: String,
    pub isbn: String,
    pub year: String,
    /// Genres, top-3 recommended but not enforced.
    pub genre: Vec<String>,
    pub pages: String,
    pub publisher: String,
    /// Cached download candidates, empty until the first link lookup.
    #[serde(default)]
    pub download_links: Vec<String>,
    /// Canonical queries this record has been returned for (set semantics).
    #[serde(default)]
    pub cached_for_queries: Vec<String>,
    /// When the record was first cached.
    pub first_cached_at: DateTime<Utc>,
    /// When the record was last overwritten by an upsert.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate statistics over the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Total cached books.
    pub total_books: u64,
    /// Distinct canonical queries across all tag sets.
    pub total_queries: u64,
    /// Books with a non-empty download-link cache.
    pub books_with_links: u64,
    /// Oldest cache entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Most recent cache entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> BookRecord {
        BookRecord {
            identity_key: "abc123".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            overview: "Desert planet politics".to_string(),
            cover_url: PLACEHOLDER_COVER_URL.to_string(),
            isbn: "9780441172719".to_string(),
            year: "1965".to_string(),
            genre: vec!["Science Fiction".to_string()],
            pages: "412".to_string(),
            publisher: "Chilton Books".to_string(),
            download_links: vec![],
            cached_for_queries: vec!["dune".to_string()],
            first_cached_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"identityKey\""));
        assert!(json.contains("\"coverUrl\""));
        assert!(json.contains("\"downloadLinks\""));
        assert!(json.contains("\"cachedForQueries\""));
        assert!(!json.contains("\"cover_url\""));
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: BookRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.identity_key, record.identity_key);
        assert_eq!(parsed.genre, record.genre);
        assert_eq!(parsed.cached_for_queries, record.cached_for_queries);
    }

    #[test]
    fn test_stats_skips_empty_timestamps() {
        let stats = StoreStats {
            total_books: 0,
            total_queries: 0,
            books_with_links: 0,
            oldest_entry: None,
            newest_entry: None,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("oldestEntry"));
        assert!(!json.contains("newestEntry"));
    }
}
