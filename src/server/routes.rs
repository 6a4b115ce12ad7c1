//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Headroom for base64 expansion and the JSON fields around a file.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes / 3 * 4 + BODY_OVERHEAD;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/profile", get(handlers::current_profile))
        // Records
        .route(
            "/api/spj",
            get(handlers::list_spj).post(handlers::create_spj),
        )
        .route(
            "/api/spj/:id",
            get(handlers::get_spj)
                .put(handlers::update_spj)
                .delete(handlers::delete_spj),
        )
        .route("/api/spj/:id/file", get(handlers::download_attachment))
        .route("/api/spj/:id/drive", post(handlers::transfer_to_drive))
        // Exports
        .route("/api/export/archive", get(handlers::export_archive))
        .route("/api/export/spreadsheet", get(handlers::export_spreadsheet))
        // Raw stored objects
        .route("/files/*key", get(handlers::serve_object))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
