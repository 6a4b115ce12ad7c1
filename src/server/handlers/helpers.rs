//! Helper types and utility functions for handlers.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::super::AppState;
use crate::models::{UserProfile, ValidationErrors};
use crate::services::RecordError;
use crate::storage::StorageError;
use crate::utils::content_disposition;

/// Header carrying the authenticated account id.
pub const USER_HEADER: &str = "x-user-id";

/// JSON error body with a status code.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub fn validation_response(errors: &ValidationErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

/// Single-field validation failure.
pub fn field_error(field: &'static str, message: impl Into<String>) -> Response {
    validation_response(&ValidationErrors::single(field, message))
}

/// Resolve the caller's profile from the identity header.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<UserProfile, Response> {
    let Some(id) = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return Err(json_error(StatusCode::UNAUTHORIZED, "Missing user identity"));
    };

    match state.profile_repo.get(id).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(json_error(StatusCode::UNAUTHORIZED, "Unknown user")),
        Err(e) => {
            tracing::error!("Failed to load profile {}: {}", id, e);
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Gagal memuat profil pengguna: {}", e),
            ))
        }
    }
}

pub fn record_error_response(e: RecordError) -> Response {
    let status = match e {
        RecordError::Validation(ref errors) => return validation_response(errors),
        RecordError::NotFound(_) | RecordError::NoFile => StatusCode::NOT_FOUND,
        RecordError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
        RecordError::Forbidden(_) => StatusCode::FORBIDDEN,
        RecordError::DriveUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        RecordError::Drive(_) => StatusCode::BAD_GATEWAY,
        RecordError::Store(_) | RecordError::Storage(_) => {
            tracing::error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, e.to_string())
}

/// Downloadable body with the given name and content type.
pub fn attachment(filename: &str, content_type: &str, content: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        content,
    )
        .into_response()
}
