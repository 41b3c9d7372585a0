//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_mb.saturating_mul(1024 * 1024);

    Router::new()
        .route("/", get(handlers::index))
        // Document processing
        .route("/process", post(handlers::process_document))
        .route("/load", post(handlers::load_index))
        // Chat
        .route("/ask", post(handlers::ask))
        .route("/chat/clear", post(handlers::clear_chat))
        .route("/chat/export", get(handlers::export_chat))
        // JSON API
        .route("/api/ask", post(handlers::api_ask))
        .route("/api/status", get(handlers::api_status))
        // Static assets (CSS/JS)
        .route("/static/style.css", get(handlers::serve_css))
        .route("/static/app.js", get(handlers::serve_js))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
