//! Book API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use bookdex_core::{BookRecord, LookupError, NewBook, SearchSource, StoreStats};

use crate::metrics;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<BookRecord>,
    pub count: usize,
    pub source: SearchSource,
}

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub links: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Identity hash of the conflicting record, on 409 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn error_response(err: LookupError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, id) = match &err {
        LookupError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, None),
        LookupError::NotFound(_) => (StatusCode::NOT_FOUND, None),
        LookupError::Conflict(key) => (StatusCode::CONFLICT, Some(key.clone())),
        LookupError::Validation(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        LookupError::Upstream(_) => (StatusCode::BAD_GATEWAY, None),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            id,
        }),
    )
}

fn failure_kind(err: &LookupError) -> &'static str {
    match err {
        LookupError::InvalidQuery(_) => "invalid_query",
        LookupError::Validation(_) => "validation",
        LookupError::NotFound(_) => "not_found",
        LookupError::Conflict(_) => "conflict",
        LookupError::Upstream(_) => "upstream",
    }
}

fn source_label(source: SearchSource) -> &'static str {
    match source {
        SearchSource::ExactCache => "exact_cache",
        SearchSource::TextSearch => "text_search",
        SearchSource::Agent => "agent",
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v2/books?search={query}
///
/// Resolve a free-text query through the tiered lookup pipeline.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, impl IntoResponse> {
    match state.lookup().search(&params.search).await {
        Ok(outcome) => {
            metrics::SEARCHES_TOTAL
                .with_label_values(&[source_label(outcome.source)])
                .inc();
            Ok(Json(SearchResponse {
                count: outcome.records.len(),
                results: outcome.records,
                source: outcome.source,
            }))
        }
        Err(e) => {
            metrics::SEARCH_FAILURES_TOTAL
                .with_label_values(&[failure_kind(&e)])
                .inc();
            Err(error_response(e))
        }
    }
}

/// POST /api/v2/books
///
/// Manually register a book in the cache.
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(new_book): Json<NewBook>,
) -> Result<(StatusCode, Json<BookRecord>), impl IntoResponse> {
    match state.lookup().add_manual(&new_book) {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/v2/books/stats
///
/// Get cache statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreStats>, impl IntoResponse> {
    match state.lookup().stats() {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/v2/books/{hash}
///
/// Get a cached book by identity hash.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<BookRecord>, impl IntoResponse> {
    match state.lookup().get(&hash) {
        Ok(record) => Ok(Json(record)),
        Err(e) => Err(error_response(e)),
    }
}

/// DELETE /api/v2/books/{hash}
///
/// Remove a book from the cache.
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<StatusCode, impl IntoResponse> {
    match state.lookup().delete(&hash) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/v2/books/{hash}/download
///
/// Get download link candidates for a cached book, fetching them via the
/// agent on first request.
pub async fn get_download_links(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<LinksResponse>, impl IntoResponse> {
    match state.lookup().links(&hash).await {
        Ok(outcome) => {
            let label = if outcome.from_cache { "cached" } else { "fetched" };
            metrics::LINK_LOOKUPS_TOTAL.with_label_values(&[label]).inc();
            Ok(Json(LinksResponse {
                links: outcome.links,
            }))
        }
        Err(e) => {
            metrics::LINK_LOOKUPS_TOTAL.with_label_values(&["failed"]).inc();
            Err(error_response(e))
        }
    }
}
