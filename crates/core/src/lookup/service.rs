use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::agent::{BookAgent, BookMetadata};
use crate::config::LookupConfig;
use crate::identity::identity_key;
use crate::store::{BookRecord, BookStore, StoreStats, PLACEHOLDER_COVER_URL};
use crate::text::{canonicalize_query, sanitize_text};

use super::types::{LinksOutcome, LookupError, NewBook, SearchOutcome, SearchSource};

/// Search orchestrator: exact cache, then text search, then the agent.
///
/// Each search runs the tiers in order and stops at the first one that
/// answers. Agent results are persisted and tagged with the canonical query
/// before being returned, so repeating the same search never pays the agent
/// cost twice.
pub struct BookLookup {
    store: Arc<dyn BookStore>,
    agent: Arc<dyn BookAgent>,
    config: LookupConfig,
}

impl BookLookup {
    pub fn new(store: Arc<dyn BookStore>, agent: Arc<dyn BookAgent>, config: LookupConfig) -> Self {
        Self {
            store,
            agent,
            config,
        }
    }

    /// Resolve a free-text search query to book records.
    pub async fn search(&self, raw_query: &str) -> Result<SearchOutcome, LookupError> {
        let canonical = canonicalize_query(raw_query);
        if canonical.is_empty() {
            return Err(LookupError::InvalidQuery(
                "query is empty after canonicalization".to_string(),
            ));
        }

        let exact = self.store.get_exact(&canonical)?;
        if !exact.is_empty() {
            info!(query = %canonical, count = exact.len(), "Exact cache hit");
            return Ok(SearchOutcome {
                records: exact,
                source: SearchSource::ExactCache,
            });
        }

        let text_hits = self
            .store
            .search_text(&canonical, self.config.text_search_limit)?;
        if text_hits.len() >= self.config.text_match_threshold {
            info!(
                query = %canonical,
                count = text_hits.len(),
                threshold = self.config.text_match_threshold,
                "Text search satisfied query from cache"
            );
            // Deliberately not tagged: a relevance match is not an exact
            // answer, so the same query stays eligible for fresher results.
            return Ok(SearchOutcome {
                records: text_hits,
                source: SearchSource::TextSearch,
            });
        }

        debug!(
            query = %canonical,
            text_hits = text_hits.len(),
            "Cache miss, consulting agent"
        );
        let candidates = self.agent.search(raw_query).await?;
        info!(
            agent = self.agent.name(),
            query = %canonical,
            count = candidates.len(),
            "Agent returned candidates"
        );

        let records = self.persist_candidates(&candidates, &canonical)?;
        Ok(SearchOutcome {
            records,
            source: SearchSource::Agent,
        })
    }

    /// Upsert agent candidates under the canonical query, deduplicating by
    /// identity within the batch (later entries overwrite earlier ones but
    /// keep the first position).
    fn persist_candidates(
        &self,
        candidates: &[BookMetadata],
        canonical: &str,
    ) -> Result<Vec<BookRecord>, LookupError> {
        let mut order: Vec<String> = Vec::new();
        let mut by_identity: HashMap<String, BookRecord> = HashMap::new();

        for candidate in candidates {
            let record = record_from_metadata(candidate);
            if !by_identity.contains_key(&record.identity_key) {
                order.push(record.identity_key.clone());
            } else {
                debug!(
                    identity = %record.identity_key,
                    title = %record.title,
                    "Duplicate identity within agent batch, keeping latest"
                );
            }
            by_identity.insert(record.identity_key.clone(), record);
        }

        let mut saved = Vec::with_capacity(order.len());
        for key in &order {
            let record = &by_identity[key];
            saved.push(self.store.upsert_with_tag(record, canonical)?);
        }
        Ok(saved)
    }

    /// Get download links for a cached book, fetching and caching them via
    /// the agent on first request.
    pub async fn links(&self, key: &str) -> Result<LinksOutcome, LookupError> {
        let record = self
            .store
            .get_by_identity(key)?
            .ok_or_else(|| LookupError::NotFound(key.to_string()))?;

        if !record.download_links.is_empty() {
            debug!(identity = %key, count = record.download_links.len(), "Link cache hit");
            return Ok(LinksOutcome {
                links: record.download_links,
                from_cache: true,
            });
        }

        let query = format!("{} {}", record.title, record.author);
        let links = self.agent.fetch_links(&query).await?;
        if links.is_empty() {
            // An empty result is cached as-is, which is indistinguishable
            // from never having fetched; the next request retries the agent.
            warn!(identity = %key, "Agent found no download links");
        }
        self.store.set_download_links(key, &links)?;
        info!(identity = %key, count = links.len(), "Cached download links");
        Ok(LinksOutcome {
            links,
            from_cache: false,
        })
    }

    /// Manually register a book. The new record starts with an empty tag set
    /// and becomes searchable through the text tier.
    pub fn add_manual(&self, new_book: &NewBook) -> Result<BookRecord, LookupError> {
        if new_book.title.trim().is_empty() || new_book.author.trim().is_empty() {
            return Err(LookupError::InvalidQuery(
                "title and author are required".to_string(),
            ));
        }

        let now = Utc::now();
        let record = BookRecord {
            identity_key: identity_key(&new_book.title, &new_book.author),
            title: new_book.title.trim().to_string(),
            author: new_book.author.trim().to_string(),
            overview: sanitize_text(&new_book.overview),
            cover_url: if new_book.cover_url.is_empty() {
                PLACEHOLDER_COVER_URL.to_string()
            } else {
                new_book.cover_url.clone()
            },
            isbn: new_book.isbn.clone(),
            year: new_book.year.clone(),
            genre: new_book.genre.clone(),
            pages: new_book.pages.clone(),
            publisher: new_book.publisher.clone(),
            download_links: vec![],
            cached_for_queries: vec![],
            first_cached_at: now,
            updated_at: now,
        };

        let saved = self.store.insert_new(&record)?;
        info!(identity = %saved.identity_key, title = %saved.title, "Manually registered book");
        Ok(saved)
    }

    /// Fetch a single cached book by identity hash.
    pub fn get(&self, key: &str) -> Result<BookRecord, LookupError> {
        self.store
            .get_by_identity(key)?
            .ok_or_else(|| LookupError::NotFound(key.to_string()))
    }

    /// Delete a cached book by identity hash.
    pub fn delete(&self, key: &str) -> Result<(), LookupError> {
        if self.store.delete_by_identity(key)? {
            info!(identity = %key, "Deleted cached book");
            Ok(())
        } else {
            Err(LookupError::NotFound(key.to_string()))
        }
    }

    /// Cache statistics.
    pub fn stats(&self) -> Result<StoreStats, LookupError> {
        Ok(self.store.stats()?)
    }
}

/// Turn an agent candidate into a persistable record: sanitize free text,
/// substitute the placeholder cover, derive the identity hash.
fn record_from_metadata(meta: &BookMetadata) -> BookRecord {
    let now = Utc::now();
    BookRecord {
        identity_key: identity_key(&meta.title, &meta.author),
        title: meta.title.clone(),
        author: meta.author.clone(),
        overview: sanitize_text(&meta.overview),
        cover_url: if meta.cover_url.is_empty() {
            PLACEHOLDER_COVER_URL.to_string()
        } else {
            meta.cover_url.clone()
        },
        isbn: meta.isbn.clone(),
        year: meta.year.clone(),
        genre: meta.genre.clone(),
        pages: meta.pages.clone(),
        publisher: meta.publisher.clone(),
        download_links: vec![],
        cached_for_queries: vec![],
        first_cached_at: now,
        updated_at: now,
    }
}
