//! Record and profile API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::helpers::{
    attachment, current_user, field_error, json_error, record_error_response,
};
use super::super::AppState;
use crate::models::{SpjInput, UserProfile};
use crate::services::{load_listing, Attachment, DriveFile, FilterParams, SpjFilter};
use crate::utils::guess_mime;

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub full_name: String,
    pub is_admin: bool,
}

/// Profile of the calling user.
pub async fn current_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_user(&state, &headers).await {
        Ok(profile) => Json(ProfileResponse {
            full_name: profile.full_name(),
            is_admin: profile.is_admin(),
            profile,
        })
        .into_response(),
        Err(response) => response,
    }
}

/// Filtered listing plus summary counts.
pub async fn list_spj(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FilterParams>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };

    let filter = match SpjFilter::from_params(&params, Some(&user)) {
        Ok(f) => f,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match load_listing(&state.spj_repo, &filter).await {
        Ok(listing) => Json(json!({
            "filter": filter,
            "records": listing.records,
            "summary": listing.summary,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load SPJ listing: {}", e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Gagal memuat data: {}", e),
            )
        }
    }
}

pub async fn get_spj(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = current_user(&state, &headers).await {
        return response;
    }
    match state.records.get(&id).await {
        Ok(spj) => Json(spj).into_response(),
        Err(e) => record_error_response(e),
    }
}

/// A file sent inline as base64.
#[derive(Debug, Deserialize)]
pub struct InlineFile {
    pub name: String,
    /// Standard base64 of the file bytes.
    pub content: String,
}

/// Create/replace request body.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(flatten)]
    pub input: SpjInput,
    #[serde(default)]
    pub file: Option<InlineFile>,
    #[serde(default)]
    pub drive_file: Option<DriveFile>,
}

impl SaveRequest {
    #[allow(clippy::result_large_err)]
    fn attachment(&mut self) -> Result<Option<Attachment>, Response> {
        if let Some(file) = self.file.take() {
            let content = base64::engine::general_purpose::STANDARD
                .decode(file.content.trim())
                .map_err(|e| field_error("file", format!("File tidak valid: {}", e)))?;
            return Ok(Some(Attachment::Upload {
                name: file.name,
                content,
            }));
        }
        Ok(self.drive_file.take().map(Attachment::Drive))
    }
}

pub async fn create_spj(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut body): Json<SaveRequest>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };
    let attachment = match body.attachment() {
        Ok(a) => a,
        Err(response) => return response,
    };

    match state.records.save(&user, &body.input, attachment, None).await {
        Ok(spj) => (StatusCode::CREATED, Json(spj)).into_response(),
        Err(e) => record_error_response(e),
    }
}

pub async fn update_spj(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<SaveRequest>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };
    let attachment = match body.attachment() {
        Ok(a) => a,
        Err(response) => return response,
    };

    match state
        .records
        .save(&user, &body.input, attachment, Some(&id))
        .await
    {
        Ok(spj) => Json(spj).into_response(),
        Err(e) => record_error_response(e),
    }
}

pub async fn delete_spj(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };
    match state.records.delete(&user, &id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => record_error_response(e),
    }
}

/// Download a record's attachment under its original name.
pub async fn download_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = current_user(&state, &headers).await {
        return response;
    }
    match state.records.open_file(&id).await {
        Ok(file) => attachment(&file.filename, &guess_mime(&file.filename), file.content),
        Err(e) => record_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// OAuth access token with Drive file scope.
    pub token: String,
}

pub async fn transfer_to_drive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TransferRequest>,
) -> Response {
    if let Err(response) = current_user(&state, &headers).await {
        return response;
    }
    match state.records.transfer_to_drive(&id, &body.token).await {
        Ok(drive_id) => Json(json!({ "id": drive_id })).into_response(),
        Err(e) => record_error_response(e),
    }
}
