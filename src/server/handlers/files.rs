//! Raw access to stored objects.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::helpers::json_error;
use super::super::AppState;
use crate::storage::{key_from_reference, StorageError};
use crate::utils::guess_mime;

/// Serve an object by key.
pub async fn serve_object(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.store.fetch(&key).await {
        Ok(content) => {
            let mime = guess_mime(key_from_reference(&key));
            ([(header::CONTENT_TYPE, mime)], content).into_response()
        }
        Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
            json_error(StatusCode::NOT_FOUND, "File not found")
        }
        Err(e) => {
            tracing::error!("Failed to read object {}: {}", key, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file")
        }
    }
}
