//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Bookdex server:
//! - Search counts broken down by which tier answered
//! - Agent call outcomes
//! - Download-link fetch outcomes
//! - Cache size (collected dynamically from store stats)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Searches answered, by tier ("exact_cache", "text_search", "agent").
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookdex_searches_total", "Total searches answered, by tier"),
        &["source"],
    )
    .unwrap()
});

/// Failed searches, by error kind.
pub static SEARCH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookdex_search_failures_total", "Total failed searches"),
        &["kind"],
    )
    .unwrap()
});

/// Download-link lookups, by outcome ("cached", "fetched", "failed").
pub static LINK_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookdex_link_lookups_total",
            "Total download-link lookups, by outcome",
        ),
        &["outcome"],
    )
    .unwrap()
});

/// Books currently cached (collected dynamically).
pub static BOOKS_CACHED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("bookdex_books_cached", "Number of books in the cache").unwrap()
});

/// Distinct canonical queries with tagged answers (collected dynamically).
pub static QUERIES_CACHED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "bookdex_queries_cached",
        "Number of distinct canonical queries in the cache",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(SEARCHES_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(SEARCH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(LINK_LOOKUPS_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(BOOKS_CACHED.clone())).unwrap();
    registry.register(Box::new(QUERIES_CACHED.clone())).unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh gauges from current store statistics before encoding.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(stats) = state.store().stats() {
        BOOKS_CACHED.set(stats.total_books as i64);
        QUERIES_CACHED.set(stats.total_queries as i64);
    }
}
