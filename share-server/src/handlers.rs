//! HTTP handlers

use axum::{
    Json,
    body::Body,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use share_core::{ContentRoot, TextEntry};

use crate::auth::RequireToken;
use crate::error::ApiError;
use crate::state::SharedState;

/// Service descriptor returned by `/` and `/api/`
#[derive(Serialize)]
pub struct ServiceInfo {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    endpoints: Endpoints,
    note: &'static str,
}

#[derive(Serialize)]
struct Endpoints {
    images: &'static str,
    text_files: &'static str,
    health: &'static str,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    images_count: usize,
    text_files_count: usize,
}

pub async fn index_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "ok",
        service: "Syrins Share API",
        version: "1.0",
        endpoints: Endpoints {
            images: "/api/images",
            text_files: "/api/text-files",
            health: "/health",
        },
        note: "Authentication required for all endpoints",
    })
}

/// Health check endpoint, exempt from the origin check
pub async fn health_handler(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let (images_count, text_files_count) = tokio::task::spawn_blocking(move || {
        (state.catalog.count_images(), state.catalog.count_text_files())
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        images_count,
        text_files_count,
    }))
}

pub async fn list_images_handler(
    _: RequireToken,
    State(state): State<SharedState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let images = tokio::task::spawn_blocking(move || state.catalog.list_images()).await?;
    Ok(Json(images))
}

pub async fn list_text_files_handler(
    _: RequireToken,
    State(state): State<SharedState>,
) -> Result<Json<Vec<TextEntry>>, ApiError> {
    let files = tokio::task::spawn_blocking(move || state.catalog.list_text_files()).await?;
    Ok(Json(files))
}

pub async fn serve_image_handler(
    _: RequireToken,
    State(state): State<SharedState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_from(&state.images, &path, request).await
}

pub async fn serve_text_handler(
    _: RequireToken,
    State(state): State<SharedState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_from(&state.text, &path, request).await
}

/// Fallback for unknown routes
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

/// Resolve inside `root` and stream the file.
///
/// `ServeFile` sets Content-Type from the extension and handles
/// Last-Modified, conditional GET and ranges.
async fn serve_from(root: &ContentRoot, requested: &str, request: Request) -> Result<Response, ApiError> {
    let path = root.resolve(requested).map_err(|e| {
        tracing::debug!("Refusing to serve {:?} from {}: {}", requested, root.path().display(), e);
        ApiError::NotFound
    })?;

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.map(Body::new).into_response())
}
