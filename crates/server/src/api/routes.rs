use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{books, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Books
        .route("/books", get(books::search))
        .route("/books", post(books::create_book))
        .route("/books/stats", get(books::get_stats))
        .route("/books/{hash}", get(books::get_book))
        .route("/books/{hash}", delete(books::delete_book))
        .route("/books/{hash}/download", get(books::get_download_links))
        .with_state(state);

    Router::new()
        .nest("/api/v2", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
