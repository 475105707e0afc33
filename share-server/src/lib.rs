//! share-server: HTTP API for shared images and text files
//!
//! Every request passes the origin allow-list first (except `/health`);
//! listing and file endpoints additionally require a time-window token.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{Router, middleware, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::{AppState, SharedState};

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/api/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/images", get(handlers::list_images_handler))
        .route("/images", get(handlers::list_images_handler))
        .route("/api/images/{*path}", get(handlers::serve_image_handler))
        .route("/images/{*path}", get(handlers::serve_image_handler))
        .route("/api/text-files", get(handlers::list_text_files_handler))
        .route("/text-files", get(handlers::list_text_files_handler))
        .route("/api/text/{*path}", get(handlers::serve_text_handler))
        .route("/text/{*path}", get(handlers::serve_text_handler))
        .fallback(handlers::not_found_handler)
        // Origin guard wraps CORS so preflights from foreign origins are deflected too
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), auth::origin_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
