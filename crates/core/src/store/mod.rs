//! Book cache store - persistent records tagged with the queries that
//! produced them.
//!
//! The store is the fast path of the service: if a query has literally been
//! answered before, or the cache already holds enough text-search matches,
//! the expensive agent call is skipped entirely.

mod sqlite;
mod types;

pub use sqlite::SqliteBookStore;
pub use types::*;

/// Trait for book cache storage.
pub trait BookStore: Send + Sync {
    /// Exact lookup by identity hash.
    fn get_by_identity(&self, key: &str) -> Result<Option<BookRecord>, StoreError>;

    /// Every record whose tag set contains this canonical query, in storage
    /// order.
    fn get_exact(&self, canonical_query: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Free-text relevance search over title, author, overview and isbn,
    /// best match first, capped at `limit`.
    fn search_text(&self, canonical_query: &str, limit: u32)
        -> Result<Vec<BookRecord>, StoreError>;

    /// Insert or overwrite the record for its identity and add
    /// `canonical_query` to its tag set (union, never replace).
    ///
    /// Scalar fields are last-writer-wins; the tag set and the download-link
    /// cache are preserved additively. Returns the post-save representation.
    fn upsert_with_tag(
        &self,
        record: &BookRecord,
        canonical_query: &str,
    ) -> Result<BookRecord, StoreError>;

    /// Insert a record that must not exist yet.
    ///
    /// Fails with [`StoreError::Conflict`] carrying the identity key if a
    /// record with the same identity is already cached.
    fn insert_new(&self, record: &BookRecord) -> Result<BookRecord, StoreError>;

    /// Replace the cached download links for an existing record. No-op when
    /// the record does not exist.
    fn set_download_links(&self, key: &str, links: &[String]) -> Result<(), StoreError>;

    /// Remove a record; returns whether anything was deleted.
    fn delete_by_identity(&self, key: &str) -> Result<bool, StoreError>;

    /// Get cache statistics.
    fn stats(&self) -> Result<StoreStats, StoreError>;
}
